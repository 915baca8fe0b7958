// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Spreadsheet export of reports.
//!
//! Produces a CSV with the same columns the office expects from the legacy
//! export, one row per report, catalog references resolved to names.

use crate::models::ReportView;

pub const EXPORT_COLUMNS: [&str; 13] = [
    "ID",
    "Matrícula",
    "Grupo",
    "Anomalía",
    "Material",
    "Descripción",
    "Latitud",
    "Longitud",
    "Estado",
    "Creado por",
    "Rol",
    "Fecha Creación",
    "Última Actualización",
];

/// Render reports as CSV, header row first.
pub fn reports_to_csv(reports: &[ReportView]) -> String {
    let mut out = String::new();
    push_row(&mut out, EXPORT_COLUMNS.iter().map(|s| s.to_string()));

    for view in reports {
        let report = &view.report;
        push_row(
            &mut out,
            [
                report.id.to_string(),
                report.matricula.clone(),
                view.grupo_nombre.clone().unwrap_or_default(),
                view.anomalia_nombre.clone().unwrap_or_default(),
                view.material_nombre.clone().unwrap_or_default(),
                report.descripcion.clone(),
                report.latitude.map(|v| v.to_string()).unwrap_or_default(),
                report.longitude.map(|v| v.to_string()).unwrap_or_default(),
                report.status.clone(),
                view.username.clone().unwrap_or_default(),
                view.user_role
                    .as_ref()
                    .map(|role| role.to_string())
                    .unwrap_or_default(),
                report.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                report.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ]
            .into_iter(),
        );
    }

    out
}

fn push_row(out: &mut String, fields: impl Iterator<Item = String>) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(&escape(&field));
    }
    out.push_str("\r\n");
}

/// RFC 4180 quoting: wrap fields containing separators or quotes, double
/// embedded quotes.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
