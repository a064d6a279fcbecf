use super::AppState;
use crate::export::consolidated_csv_bytes;
use crate::models::{IngestReport, IngestStatus, ReconcileReport};
use axum::{
    extract::{Json, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::io::Write;
use tempfile::NamedTempFile;

/// 通用响应体
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// 导入响应体
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub report: IngestReport,
}

/// 汇总响应体
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub message: String,
    pub report: Option<ReconcileReport>,
}

fn message(status: StatusCode, message: impl Into<String>) -> Response {
    let response = MessageResponse {
        success: status.is_success(),
        message: message.into(),
    };
    (status, Json(response)).into_response()
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 上传文件落盘到临时文件, 离开作用域即删除
struct Upload {
    file: Option<NamedTempFile>,
    supplier_name: Option<String>,
}

async fn read_upload(multipart: &mut Multipart, max_bytes: usize) -> Result<Upload, Response> {
    let mut upload = Upload {
        file: None,
        supplier_name: None,
    };

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(message(StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e))),
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let mut temp = NamedTempFile::new().map_err(|e| {
                    tracing::error!("Failed to create temp file: {}", e);
                    message(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store upload")
                })?;
                let mut written = 0usize;
                loop {
                    let chunk = match field.chunk().await {
                        Ok(Some(chunk)) => chunk,
                        Ok(None) => break,
                        Err(e) => {
                            return Err(message(
                                StatusCode::BAD_REQUEST,
                                format!("Invalid upload: {}", e),
                            ))
                        }
                    };
                    written += chunk.len();
                    if written > max_bytes {
                        return Err(message(
                            StatusCode::PAYLOAD_TOO_LARGE,
                            format!("File exceeds {} bytes", max_bytes),
                        ));
                    }
                    temp.write_all(&chunk).map_err(|e| {
                        tracing::error!("Failed to write upload: {}", e);
                        message(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store upload")
                    })?;
                }
                upload.file = Some(temp);
            }
            Some("supplier_name") => {
                let text = field.text().await.map_err(|e| {
                    message(StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e))
                })?;
                upload.supplier_name = Some(text);
            }
            _ => {}
        }
    }

    Ok(upload)
}

/// 导入供应商费率文件 (multipart: file, supplier_name)
pub async fn import_rates(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let upload = match read_upload(&mut multipart, state.max_upload_bytes).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };

    let Some(file) = upload.file else {
        return message(StatusCode::BAD_REQUEST, "No file uploaded");
    };
    let supplier_name = upload
        .supplier_name
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    if supplier_name.is_empty() {
        return message(StatusCode::BAD_REQUEST, "Supplier name is required");
    }

    match state.ingest.ingest_file(file.path(), supplier_name).await {
        Ok(report) => {
            let status = match report.status {
                IngestStatus::Imported => StatusCode::OK,
                IngestStatus::NoHeader | IngestStatus::NoValidRows => StatusCode::BAD_REQUEST,
            };
            let response = ImportResponse {
                success: report.status == IngestStatus::Imported,
                message: report.message(),
                report,
            };
            (status, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("Import for supplier {} failed: {}", supplier_name, e);
            message(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e))
        }
    }
}

/// 某供应商的全部费率
pub async fn rates_for_supplier(
    State(state): State<AppState>,
    Path(supplier_id): Path<i64>,
) -> Response {
    match state.rates.rates_for_supplier(supplier_id).await {
        Ok(rates) => (StatusCode::OK, Json(rates)).into_response(),
        Err(e) => message(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)),
    }
}

pub async fn delete_rate(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.rates.delete_rate(id).await {
        Ok(true) => message(StatusCode::OK, "Rate deleted"),
        Ok(false) => message(StatusCode::NOT_FOUND, "Rate not found"),
        Err(e) => message(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)),
    }
}

pub async fn list_consolidated(State(state): State<AppState>) -> Response {
    match state.consolidated.list_consolidated().await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => message(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)),
    }
}

pub async fn consolidated_by_prefix(
    State(state): State<AppState>,
    Path(prefix): Path<String>,
) -> Response {
    match state.consolidated.consolidated_by_prefix(&prefix).await {
        Ok(Some(row)) => (StatusCode::OK, Json(row)).into_response(),
        Ok(None) => message(StatusCode::NOT_FOUND, "Rate not found"),
        Err(e) => message(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)),
    }
}

/// 手动触发汇总 (同步执行, 完成后返回)
pub async fn generate_consolidated(State(state): State<AppState>) -> Response {
    match state.engine.reconcile().await {
        Ok(report) => {
            let response = GenerateResponse {
                success: true,
                message: "Consolidated rates generated successfully.".to_string(),
                report: Some(report),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            let response = GenerateResponse {
                success: false,
                message: format!("Error: {}", e),
                report: None,
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
    }
}

/// 先汇总再导出 CSV
pub async fn export_consolidated(State(state): State<AppState>) -> Response {
    if let Err(e) = state.engine.reconcile().await {
        tracing::error!("Export aborted, consolidation failed: {}", e);
        return message(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to consolidate rates: {}", e),
        );
    }

    let rows = match state.consolidated.list_consolidated().await {
        Ok(rows) => rows,
        Err(e) => return message(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)),
    };
    if rows.is_empty() {
        return message(
            StatusCode::BAD_REQUEST,
            "No consolidated rates available to export.",
        );
    }

    match consolidated_csv_bytes(&rows) {
        Ok(body) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"consolidated_rates.csv\"",
                ),
            ],
            body,
        )
            .into_response(),
        Err(e) => message(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)),
    }
}
