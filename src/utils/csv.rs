use crate::error::{Result, SchedulerError};
use crate::graph::{ConflictGraph, Enrollment};
use crate::schedule::Timetable;
use std::io::Write;

pub const STUDENT_COLUMN: &str = "student_id";
pub const EXAM_COLUMN: &str = "exam";
pub const SCHEDULE_HEADER: [&str; 5] = ["Exam", "Slot", "start", "duration", "TimeLabel"];

/// Parses `student_id,exam` rows into an [`Enrollment`].
///
/// The header locates both columns; other columns are ignored. Rows with an
/// empty student or exam cell are skipped, blank lines are ignored.
pub fn parse_enrollment_csv(text: &str) -> Result<Enrollment> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty());

    let mut enrollment = Enrollment::new();
    let Some((header_line, header)) = lines.next() else {
        return Ok(enrollment);
    };
    let columns = split_record(header, header_line)?;
    let student_col = column_index(&columns, STUDENT_COLUMN, header_line)?;
    let exam_col = column_index(&columns, EXAM_COLUMN, header_line)?;
    let width = student_col.max(exam_col) + 1;

    for (line_no, line) in lines {
        let fields = split_record(line, line_no)?;
        if fields.len() < width {
            return Err(SchedulerError::Csv {
                line: line_no,
                reason: format!("expected at least {width} columns, found {}", fields.len()),
            });
        }
        let student = fields[student_col].trim();
        let exam = fields[exam_col].trim();
        if student.is_empty() || exam.is_empty() {
            continue;
        }
        enrollment.enroll(student, exam);
    }
    Ok(enrollment)
}

/// Parses a hand-written conflict list into a [`ConflictGraph`].
///
/// A line with one name declares an exam; `a,b` declares both exams and a
/// conflict between them. `a,a` only declares `a`. `#` starts a comment.
pub fn parse_conflict_list(text: &str) -> Result<ConflictGraph> {
    let mut graph = ConflictGraph::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        match fields.as_slice() {
            [exam] if !exam.is_empty() => {
                graph.add_exam(*exam);
            }
            [a, b] if !a.is_empty() && !b.is_empty() => {
                if a == b {
                    graph.add_exam(*a);
                } else {
                    graph.add_conflict(*a, *b);
                }
            }
            _ => {
                return Err(SchedulerError::Csv {
                    line: line_no,
                    reason: format!("expected 'exam' or 'exam,exam', found '{line}'"),
                });
            }
        }
    }
    Ok(graph)
}

/// Writes the timetable as CSV. `Slot` is written one-based.
pub fn write_schedule_csv<W: Write>(mut writer: W, timetable: &Timetable) -> Result<()> {
    writeln!(writer, "{}", SCHEDULE_HEADER.join(","))?;
    for row in &timetable.rows {
        writeln!(
            writer,
            "{},{},{},{},{}",
            escape_field(row.exam.as_str()),
            row.slot + 1,
            row.start,
            row.duration,
            escape_field(&row.label)
        )?;
    }
    writer.flush()?;
    Ok(())
}

pub fn schedule_csv_bytes(timetable: &Timetable) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_schedule_csv(&mut buf, timetable)?;
    Ok(buf)
}

fn column_index(columns: &[String], name: &str, line: usize) -> Result<usize> {
    columns
        .iter()
        .position(|column| column.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| SchedulerError::Csv {
            line,
            reason: format!("header is missing the '{name}' column"),
        })
}

/// Splits one CSV record, honouring double-quoted fields.
fn split_record(line: &str, line_no: usize) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    if in_quotes {
        return Err(SchedulerError::Csv {
            line: line_no,
            reason: "unterminated quoted field".to_string(),
        });
    }
    fields.push(current);
    Ok(fields)
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
