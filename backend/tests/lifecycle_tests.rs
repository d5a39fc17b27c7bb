//! Stock lifecycle tests
//!
//! Covers the record lifecycle end to end against the entity store:
//! - Purchase round trip and field validation
//! - Sale state machine (Purchased -> Sold, no way back)
//! - Replenishment linking in both directions
//! - Cascading bulk delete and its idempotence

use std::time::Duration;

use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use lsm::error::AppError;
use lsm::services::stock::{
    CreatePurchaseInput, RecordSaleInput, RecordWeightInput, StockService, UpdateStockInput,
};
use lsm::store::StockStore;
use shared::types::{PesoTipo, WeightUnit};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn service() -> StockService {
    StockService::new(StockStore::new(Duration::from_secs(5)))
}

fn purchase_input(nro_stock: &str, nro_lote: u32) -> CreatePurchaseInput {
    CreatePurchaseInput {
        nro_stock: Some(nro_stock.to_string()),
        nro_lote: Some(nro_lote),
        fecha: Some("2023-01-10".to_string()),
        peso_entrada: Some(dec("250")),
        unidad_peso: WeightUnit::Kg,
        precio: Some(dec("1.5")),
        tipo_stock: Some("Hereford".to_string()),
        stock_reposicion: None,
        notas: None,
    }
}

fn sale_input() -> RecordSaleInput {
    RecordSaleInput {
        fecha: Some("2023-03-10".to_string()),
        peso: Some(dec("280")),
        unidad_peso: WeightUnit::Kg,
        precio: Some(dec("2.0")),
        stock_reposicion: None,
    }
}

// ============================================================================
// Purchase
// ============================================================================

#[tokio::test]
async fn test_purchase_round_trip() {
    let service = service();
    let created = service
        .create_purchase(purchase_input("101", 2))
        .await
        .unwrap();

    assert_eq!(created.serial_nro, "101-2");
    assert_eq!(created.nro_stock, "101");
    assert_eq!(created.nro_lote, 2);
    assert!(created.venta.is_none());
    assert!(!created.perdida);

    let details = service.get_details(created.id).await.unwrap();
    let body = &details.response;

    // submitted purchase fields come back unchanged
    assert_eq!(body.stock.compra.fecha.to_string(), "2023-01-10");
    assert_eq!(body.stock.compra.precio, dec("1.5"));

    // exactly one weight observation, the purchase one
    assert_eq!(body.stock.pesos.len(), 1);
    let entrada = &body.stock.pesos[0];
    assert_eq!(entrada.tipo, PesoTipo::Compra);
    assert_eq!(entrada.peso, dec("250"));
    assert_eq!(entrada.unidad, WeightUnit::Kg);

    assert_eq!(body.total_precio_compra, dec("375.00"));
    assert_eq!(details.profit, None);
    assert_eq!(body.dias_transcurridos, None);
}

#[tokio::test]
async fn test_purchase_requires_fields() {
    let service = service();

    let mut missing_stock = purchase_input("101", 2);
    missing_stock.nro_stock = None;
    let mut missing_lote = purchase_input("101", 2);
    missing_lote.nro_lote = None;
    let mut missing_fecha = purchase_input("101", 2);
    missing_fecha.fecha = None;
    let mut missing_peso = purchase_input("101", 2);
    missing_peso.peso_entrada = None;
    let mut missing_precio = purchase_input("101", 2);
    missing_precio.precio = None;

    for input in [
        missing_stock,
        missing_lote,
        missing_fecha,
        missing_peso,
        missing_precio,
    ] {
        let err = service.create_purchase(input).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }), "{:?}", err);
    }
}

#[tokio::test]
async fn test_purchase_rejects_out_of_range_fields() {
    let service = service();

    let mut bad_lote = purchase_input("101", 2);
    bad_lote.nro_lote = Some(0);
    let mut bad_peso = purchase_input("101", 2);
    bad_peso.peso_entrada = Some(dec("0.4"));
    let mut bad_precio = purchase_input("101", 2);
    bad_precio.precio = Some(dec("0.05"));
    let mut bad_tipo = purchase_input("101", 2);
    bad_tipo.tipo_stock = Some("Dragon".to_string());

    for input in [bad_lote, bad_peso, bad_precio, bad_tipo] {
        let err = service.create_purchase(input).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }), "{:?}", err);
    }
}

#[tokio::test]
async fn test_purchase_duplicate_serial_rejected() {
    let service = service();
    service
        .create_purchase(purchase_input("101", 2))
        .await
        .unwrap();

    let err = service
        .create_purchase(purchase_input("101", 2))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { field, .. } if field == "serialNro"));

    // same cattle number in a different batch is a different serial
    service
        .create_purchase(purchase_input("101", 3))
        .await
        .unwrap();
}

// ============================================================================
// Weight checks
// ============================================================================

#[tokio::test]
async fn test_record_weight_appends_control_observation() {
    let service = service();
    let stock = service
        .create_purchase(purchase_input("101", 2))
        .await
        .unwrap();

    let peso = service
        .record_weight(
            stock.id,
            RecordWeightInput {
                fecha: Some("2023-02-01".to_string()),
                peso: Some(dec("260")),
                unidad_peso: WeightUnit::Kg,
            },
        )
        .await
        .unwrap();
    assert_eq!(peso.tipo, PesoTipo::Control);

    let details = service.get_details(stock.id).await.unwrap();
    let pesos = &details.response.stock.pesos;
    assert_eq!(pesos.len(), 2);
    // newest first
    assert_eq!(pesos[0].tipo, PesoTipo::Control);
    assert_eq!(pesos[1].tipo, PesoTipo::Compra);
    assert_eq!(details.response.last_peso.as_ref().unwrap().peso, dec("260"));
}

#[tokio::test]
async fn test_record_weight_unknown_stock_is_not_found() {
    let service = service();
    let err = service
        .record_weight(
            Uuid::new_v4(),
            RecordWeightInput {
                fecha: Some("2023-02-01".to_string()),
                peso: Some(dec("260")),
                unidad_peso: WeightUnit::Kg,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

// ============================================================================
// Sale
// ============================================================================

#[tokio::test]
async fn test_sale_scenario_metrics() {
    let service = service();
    let stock = service
        .create_purchase(purchase_input("101", 2))
        .await
        .unwrap();

    let sold = service.record_sale(stock.id, sale_input()).await.unwrap();
    assert!(sold.venta.is_some());

    let details = service.get_details(stock.id).await.unwrap();
    let body = &details.response;
    assert_eq!(body.total_precio_compra, dec("375.00"));
    assert_eq!(body.total_precio_venta, Some(dec("560.00")));
    assert_eq!(details.profit, Some(dec("185.00")));
    assert_eq!(body.dias_transcurridos, Some(59));
    assert_eq!(body.peso_promedio, Some(dec("265.00")));
}

#[tokio::test]
async fn test_double_sale_rejected_and_first_sale_intact() {
    let service = service();
    let stock = service
        .create_purchase(purchase_input("101", 2))
        .await
        .unwrap();
    service.record_sale(stock.id, sale_input()).await.unwrap();

    let mut second = sale_input();
    second.precio = Some(dec("9.9"));
    let err = service.record_sale(stock.id, second).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    let details = service.get_details(stock.id).await.unwrap();
    let venta = details.response.stock.venta.unwrap();
    assert_eq!(venta.precio, dec("2.0"));
    // still exactly one sale observation
    let sale_pesos: Vec<_> = details
        .response
        .stock
        .pesos
        .iter()
        .filter(|p| p.tipo == PesoTipo::Venta)
        .collect();
    assert_eq!(sale_pesos.len(), 1);
}

#[tokio::test]
async fn test_concurrent_sales_exactly_one_wins() {
    let service = service();
    let stock = service
        .create_purchase(purchase_input("101", 2))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        service.record_sale(stock.id, sale_input()),
        service.record_sale(stock.id, sale_input())
    );
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1, "{:?} / {:?}", a, b);
}

#[tokio::test]
async fn test_sale_date_cannot_precede_purchase() {
    let service = service();
    let stock = service
        .create_purchase(purchase_input("101", 2))
        .await
        .unwrap();

    let mut early = sale_input();
    early.fecha = Some("2023-01-09".to_string());
    let err = service.record_sale(stock.id, early).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { field, .. } if field == "fecha"));
}

#[tokio::test]
async fn test_sale_unknown_stock_is_not_found() {
    let service = service();
    let err = service
        .record_sale(Uuid::new_v4(), sale_input())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

// ============================================================================
// Replenishment
// ============================================================================

#[tokio::test]
async fn test_purchase_replenishes_prior_sale() {
    let service = service();
    let prior = service
        .create_purchase(purchase_input("101", 2))
        .await
        .unwrap();
    service.record_sale(prior.id, sale_input()).await.unwrap();

    let mut input = purchase_input("102", 2);
    input.fecha = Some("2023-03-12".to_string());
    input.stock_reposicion = Some(prior.id.to_string());
    let replacement = service.create_purchase(input).await.unwrap();

    // backward link on the new purchase carries the prior serial
    let compra_ref = replacement.compra.reposicion.as_ref().unwrap();
    assert_eq!(compra_ref.id, prior.id);
    assert_eq!(compra_ref.serial_nro, "101-2");

    // reciprocal forward link on the sold stock
    let prior_details = service.get_details(prior.id).await.unwrap();
    let venta = prior_details.response.stock.venta.unwrap();
    assert_eq!(venta.reposicion.unwrap().id, replacement.id);
}

#[tokio::test]
async fn test_sale_replenishment_sets_reciprocal_link() {
    let service = service();
    let sold = service
        .create_purchase(purchase_input("101", 2))
        .await
        .unwrap();
    let replacement = service
        .create_purchase(purchase_input("102", 2))
        .await
        .unwrap();

    let mut input = sale_input();
    input.stock_reposicion = Some(replacement.id.to_string());
    let view = service.record_sale(sold.id, input).await.unwrap();
    assert_eq!(view.venta.unwrap().reposicion.unwrap().id, replacement.id);

    let replacement_details = service.get_details(replacement.id).await.unwrap();
    let compra_ref = replacement_details.response.stock.compra.reposicion.unwrap();
    assert_eq!(compra_ref.id, sold.id);
}

#[tokio::test]
async fn test_dangling_replenishment_rejected_at_write_time() {
    let service = service();

    let mut input = purchase_input("101", 2);
    input.stock_reposicion = Some(Uuid::new_v4().to_string());
    let err = service.create_purchase(input).await.unwrap_err();
    assert!(matches!(err, AppError::ReferentialIntegrity(_)));
}

#[tokio::test]
async fn test_unsold_stock_cannot_be_replenished() {
    let service = service();
    let unsold = service
        .create_purchase(purchase_input("101", 2))
        .await
        .unwrap();

    let mut input = purchase_input("102", 2);
    input.stock_reposicion = Some(unsold.id.to_string());
    let err = service.create_purchase(input).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

#[tokio::test]
async fn test_replenishment_candidates_are_sold_and_unreplenished() {
    let service = service();
    let unsold = service
        .create_purchase(purchase_input("101", 2))
        .await
        .unwrap();
    let sold = service
        .create_purchase(purchase_input("102", 2))
        .await
        .unwrap();
    service.record_sale(sold.id, sale_input()).await.unwrap();

    let candidates = service.list_replenishment_candidates().await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, sold.id);
    assert!(candidates.iter().all(|c| c.id != unsold.id));

    // once replenished, it drops out of the candidate list
    let mut input = purchase_input("103", 2);
    input.fecha = Some("2023-03-12".to_string());
    input.stock_reposicion = Some(sold.id.to_string());
    service.create_purchase(input).await.unwrap();

    let candidates = service.list_replenishment_candidates().await.unwrap();
    assert!(candidates.is_empty());
}

// ============================================================================
// Bulk delete
// ============================================================================

#[tokio::test]
async fn test_bulk_delete_cascades_and_clears_links() {
    let service = service();
    let sold = service
        .create_purchase(purchase_input("101", 2))
        .await
        .unwrap();
    service.record_sale(sold.id, sale_input()).await.unwrap();

    let mut input = purchase_input("102", 2);
    input.fecha = Some("2023-03-12".to_string());
    input.stock_reposicion = Some(sold.id.to_string());
    let replacement = service.create_purchase(input).await.unwrap();

    let removed = service.delete_stocks(&[sold.id]).await.unwrap();
    assert_eq!(removed, 1);

    // gone, pesos included
    assert!(matches!(
        service.get_details(sold.id).await.unwrap_err(),
        AppError::NotFound(_)
    ));

    // the surviving stock no longer points at the deleted one
    let details = service.get_details(replacement.id).await.unwrap();
    assert!(details.response.stock.compra.reposicion.is_none());
}

#[tokio::test]
async fn test_bulk_delete_is_idempotent() {
    let service = service();
    let stock = service
        .create_purchase(purchase_input("101", 2))
        .await
        .unwrap();
    let ghost = Uuid::new_v4();

    let removed = service.delete_stocks(&[stock.id, ghost]).await.unwrap();
    assert_eq!(removed, 1);

    let removed = service.delete_stocks(&[stock.id, ghost]).await.unwrap();
    assert_eq!(removed, 0);
}

// ============================================================================
// Queries and edits
// ============================================================================

#[tokio::test]
async fn test_lote_nros_distinct_and_sorted() {
    let service = service();
    service
        .create_purchase(purchase_input("101", 7))
        .await
        .unwrap();
    service
        .create_purchase(purchase_input("102", 2))
        .await
        .unwrap();
    service
        .create_purchase(purchase_input("103", 7))
        .await
        .unwrap();

    let lotes = service.list_lote_nros().await.unwrap();
    assert_eq!(lotes, vec![2, 7]);
}

#[tokio::test]
async fn test_update_stock_edit_path() {
    let service = service();
    let stock = service
        .create_purchase(purchase_input("101", 2))
        .await
        .unwrap();

    let updated = service
        .update_stock(
            stock.id,
            UpdateStockInput {
                precio_compra: Some(dec("2.0")),
                peso_compra: Some(dec("300")),
                perdida: Some(true),
                notas: Some("thin on arrival".to_string()),
                ..UpdateStockInput::default()
            },
        )
        .await
        .unwrap();
    assert!(updated.perdida);
    assert_eq!(updated.notas.as_deref(), Some("thin on arrival"));
    assert_eq!(updated.compra.precio, dec("2.0"));
    assert_eq!(updated.compra.peso.as_ref().unwrap().peso, dec("300"));

    // the purchase observation kept its identity and tipo
    let details = service.get_details(stock.id).await.unwrap();
    assert_eq!(details.response.stock.pesos.len(), 1);
    assert_eq!(details.response.stock.pesos[0].tipo, PesoTipo::Compra);
    assert_eq!(details.response.total_precio_compra, dec("600.00"));
}

#[tokio::test]
async fn test_update_rejects_sale_fields_on_unsold_stock() {
    let service = service();
    let stock = service
        .create_purchase(purchase_input("101", 2))
        .await
        .unwrap();

    let err = service
        .update_stock(
            stock.id,
            UpdateStockInput {
                precio_venta: Some(dec("3.0")),
                ..UpdateStockInput::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

#[tokio::test]
async fn test_attach_image_keeps_filename_reference() {
    let service = service();
    let stock = service
        .create_purchase(purchase_input("101", 2))
        .await
        .unwrap();

    let updated = service
        .attach_image(stock.id, "image_1700000000000.jpg".to_string())
        .await
        .unwrap();
    assert_eq!(updated.imagen.as_deref(), Some("image_1700000000000.jpg"));
}
