use crate::error::AppError;
use chrono::{DateTime, Utc};
use rust_xlsxwriter::Workbook;

#[derive(Debug, Clone)]
pub struct ParticipantRow {
    pub full_name: String,
    pub email: String,
    pub status: String,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct EventRow {
    pub id: String,
    pub title: String,
    pub status: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub participants_count: i64,
}

const PARTICIPANT_HEADERS: [&str; 5] = ["ФИО", "Email", "Статус", "Подтверждено", "Отменено"];
const EVENT_HEADERS: [&str; 6] = ["ID", "Название", "Статус", "Начало", "Окончание", "Участники"];

fn stamp(value: Option<DateTime<Utc>>) -> String {
    value.map(|v| v.to_rfc3339()).unwrap_or_default()
}

pub fn participants_csv(rows: &[ParticipantRow]) -> String {
    let mut out = String::from("fullName;email\n");
    for row in rows {
        if row.status == "CONFIRMED" {
            out.push_str(&format!("{};{}\n", row.full_name, row.email));
        }
    }
    out
}

pub fn participants_xlsx(rows: &[ParticipantRow]) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Participants").map_err(xlsx_error)?;

    for (col, title) in PARTICIPANT_HEADERS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *title).map_err(xlsx_error)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet.write_string(r, 0, &row.full_name).map_err(xlsx_error)?;
        worksheet.write_string(r, 1, &row.email).map_err(xlsx_error)?;
        worksheet.write_string(r, 2, &row.status).map_err(xlsx_error)?;
        worksheet.write_string(r, 3, stamp(row.confirmed_at)).map_err(xlsx_error)?;
        worksheet.write_string(r, 4, stamp(row.cancelled_at)).map_err(xlsx_error)?;
    }

    workbook.save_to_buffer().map_err(xlsx_error)
}

pub fn events_csv(rows: &[EventRow]) -> String {
    let mut out = String::from("id;title;status;startAt;endAt;participants\n");
    for row in rows {
        out.push_str(&format!(
            "{};{};{};{};{};{}\n",
            row.id,
            row.title,
            row.status,
            row.start_at.to_rfc3339(),
            row.end_at.to_rfc3339(),
            row.participants_count
        ));
    }
    out
}

pub fn events_xlsx(rows: &[EventRow]) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Events").map_err(xlsx_error)?;

    for (col, title) in EVENT_HEADERS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *title).map_err(xlsx_error)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet.write_string(r, 0, &row.id).map_err(xlsx_error)?;
        worksheet.write_string(r, 1, &row.title).map_err(xlsx_error)?;
        worksheet.write_string(r, 2, &row.status).map_err(xlsx_error)?;
        worksheet.write_string(r, 3, row.start_at.to_rfc3339()).map_err(xlsx_error)?;
        worksheet.write_string(r, 4, row.end_at.to_rfc3339()).map_err(xlsx_error)?;
        worksheet
            .write_number(r, 5, row.participants_count as f64)
            .map_err(xlsx_error)?;
    }

    workbook.save_to_buffer().map_err(xlsx_error)
}

fn xlsx_error(e: rust_xlsxwriter::XlsxError) -> AppError {
    AppError::InternalWithMsg(format!("XLSX build failed: {}", e))
}
