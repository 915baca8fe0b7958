// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Map export: reports with coordinates as GeoJSON.

use serde_json::{json, Value};

use crate::dispatch::{HandlerResult, RequestCtx};
use crate::models::ReportView;
use crate::response::ok;

/// `GET ?controller=map` / `?controller=map&action=locations`
pub async fn locations(ctx: RequestCtx) -> HandlerResult {
    collect_locations(ctx, None).await
}

/// `GET ?controller=map&action=filter&status=<status>`
pub async fn filtered(ctx: RequestCtx) -> HandlerResult {
    let status = ctx.param("status").map(str::to_string);
    collect_locations(ctx, status).await
}

async fn collect_locations(ctx: RequestCtx, status: Option<String>) -> HandlerResult {
    ctx.authenticate()?;
    let store = ctx.state.store.read().await;
    let views = store.reports_with_location(status.as_deref());

    let message = if views.is_empty() {
        "no reports with location found"
    } else {
        "report locations found"
    };
    Ok(ok(message, feature_collection(&views)))
}

/// Shape reports as a GeoJSON `FeatureCollection` of points.
fn feature_collection(views: &[ReportView]) -> Value {
    let features: Vec<Value> = views.iter().filter_map(feature).collect();
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

fn feature(view: &ReportView) -> Option<Value> {
    let report = &view.report;
    let (latitude, longitude) = (report.latitude?, report.longitude?);

    let title = format!(
        "{} - {}",
        view.grupo_nombre.as_deref().unwrap_or(""),
        view.anomalia_nombre.as_deref().unwrap_or("")
    );

    Some(json!({
        "type": "Feature",
        "geometry": {
            "type": "Point",
            // GeoJSON positions are [longitude, latitude].
            "coordinates": [longitude, latitude],
        },
        "properties": {
            "id": report.id,
            "title": title,
            "matricula": report.matricula,
            "status": report.status,
            "created_at": report.created_at,
            "user_role": view.user_role,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::models::Report;
    use chrono::Utc;

    fn view(latitude: Option<f64>, longitude: Option<f64>) -> ReportView {
        let now = Utc::now();
        ReportView {
            report: Report {
                id: 1,
                matricula: "TX-1042".into(),
                grupo_id: 1,
                anomalia_id: 2,
                material_id: None,
                descripcion: "poste inclinado".into(),
                latitude,
                longitude,
                status: "pendiente".into(),
                user_id: 7,
                images: vec![],
                created_at: now,
                updated_at: now,
            },
            grupo_nombre: Some("Distribución".into()),
            anomalia_nombre: Some("Poste dañado".into()),
            material_nombre: None,
            username: Some("ana".into()),
            user_role: Some(Role::Sobrestante),
        }
    }

    #[test]
    fn features_use_lon_lat_order() {
        let collection = feature_collection(&[view(Some(19.43), Some(-99.13))]);
        let coords = &collection["features"][0]["geometry"]["coordinates"];
        assert_eq!(coords[0], -99.13);
        assert_eq!(coords[1], 19.43);
        assert_eq!(
            collection["features"][0]["properties"]["title"],
            "Distribución - Poste dañado"
        );
    }

    #[test]
    fn reports_without_coordinates_are_skipped() {
        let collection = feature_collection(&[view(None, Some(-99.13)), view(None, None)]);
        assert_eq!(collection["features"].as_array().unwrap().len(), 0);
        assert_eq!(collection["type"], "FeatureCollection");
    }
}
