//! Black-box journeys through the public operations, including the wire
//! envelopes an embedding transport would serialize.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use shopcore_auth::StaticTokenValidator;
use shopcore_core::{AuthToken, Money};
use shopcore_engine::{
    Accepted, CheckoutOrderRequest, Collaborators, DeleteOrderRequest, EngineConfig, Envelope,
    ReservationEngine, UpdateOrderError, UpdateOrderRequest,
};
use shopcore_ledger::{InventoryLedger, InventoryRecord, ItemMetadata};

const AUTH: &str = "8zQ74sSawCfWza05";

fn shop(now: DateTime<Utc>) -> ReservationEngine {
    let ledger = InventoryLedger::new();
    ledger
        .register(InventoryRecord::new(
            "I-00001".parse().unwrap(),
            1,
            Money::new(2_500_000_000, "USD".parse().unwrap()),
            ItemMetadata {
                brand: "Vaenesston Zoo".to_string(),
                description: "Female unicorn".to_string(),
                size: "Medium horse (16hh)".to_string(),
                colour: "White".to_string(),
                photos: vec![],
            },
            now,
        ))
        .unwrap();
    ledger
        .register(InventoryRecord::new(
            "I-00002".parse().unwrap(),
            100,
            Money::new(1499, "PLN".parse().unwrap()),
            ItemMetadata {
                brand: "Handmade Flags".to_string(),
                description: "Flag of Quidthovice".to_string(),
                size: "150cm x 100cm".to_string(),
                colour: "State colours".to_string(),
                photos: vec![],
            },
            now,
        ))
        .unwrap();

    let validator = Arc::new(StaticTokenValidator::new());
    validator.issue_for(
        AuthToken::new(AUTH).unwrap(),
        now,
        Duration::minutes(30),
    );

    ReservationEngine::new(
        EngineConfig::default(),
        Arc::new(ledger),
        Collaborators::permissive(validator),
    )
}

#[test]
fn full_shopping_journey() -> anyhow::Result<()> {
    let now = Utc::now();
    let engine = shop(now);

    let basket = engine.create_order_at(AUTH, now)?.basket_token.to_string();

    engine.update_order_at(
        &UpdateOrderRequest {
            basket_token: basket.clone(),
            item_id: "I-00002".to_string(),
            qty: 3,
        },
        now,
    )?;
    engine.delete_order_at(
        &DeleteOrderRequest {
            basket_token: basket.clone(),
            item_id: "I-00002".to_string(),
            qty: 1,
        },
        now + Duration::minutes(5),
    )?;

    let listed = engine.list_orders_at(&basket, now + Duration::minutes(6))?;
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].quantity, 2);
    assert_eq!(listed.items[0].description, "Flag of Quidthovice");
    assert_eq!(
        listed.items[0].line_total,
        Money::new(2998, "PLN".parse().unwrap())
    );

    let summary = engine.checkout_order_at(
        &CheckoutOrderRequest {
            basket_token: basket.clone(),
            auth_token: AUTH.to_string(),
        },
        now + Duration::minutes(10),
    )?;
    assert_eq!(summary.invoice_currency, "PLN".parse().unwrap());
    assert_eq!(summary.goods_cost, Money::new(2998, "PLN".parse().unwrap()));
    assert_eq!(summary.ship_cost, Money::new(4000, "PLN".parse().unwrap()));
    assert_eq!(summary.invoice_code.as_str(), "Z-000001");

    // The reserved units became a sale: 100 - 2 on the shelf.
    assert_eq!(
        engine
            .ledger()
            .stock_of(&"I-00002".parse().unwrap())
            .unwrap(),
        98
    );
    assert_eq!(engine.invoices().count(), 1);
    Ok(())
}

#[test]
fn wire_envelopes_spell_the_documented_codes() {
    let now = Utc::now();
    let engine = shop(now);
    let basket = engine
        .create_order_at(AUTH, now)
        .unwrap()
        .basket_token
        .to_string();

    // Happy update: bare OK tag.
    let ok = Envelope::from_result(engine.update_order_at(
        &UpdateOrderRequest {
            basket_token: basket.clone(),
            item_id: "I-00002".to_string(),
            qty: 1,
        },
        now,
    ));
    assert_eq!(
        serde_json::to_string(&ok).unwrap(),
        r#"{"status":"OK"}"#
    );

    // Expired basket: documented error code on the wire.
    let expired = Envelope::from_result(engine.update_order_at(
        &UpdateOrderRequest {
            basket_token: basket.clone(),
            item_id: "I-00002".to_string(),
            qty: 1,
        },
        now + Duration::minutes(31),
    ));
    assert_eq!(
        serde_json::to_string(&expired).unwrap(),
        r#"{"status":"ERROR","error":"basket_expired"}"#
    );
}

#[test]
fn partial_fulfilment_keeps_what_it_could_get() {
    let now = Utc::now();
    let engine = shop(now);
    let basket = engine
        .create_order_at(AUTH, now)
        .unwrap()
        .basket_token
        .to_string();

    // Only one unicorn in stock.
    let err = engine
        .update_order_at(
            &UpdateOrderRequest {
                basket_token: basket.clone(),
                item_id: "I-00001".to_string(),
                qty: 3,
            },
            now,
        )
        .unwrap_err();
    assert_eq!(
        err,
        UpdateOrderError::PartialOrder {
            requested: 3,
            reserved: 1,
        }
    );

    let envelope: Envelope<Accepted> = Envelope::from_result(Err(err));
    assert_eq!(
        serde_json::to_string(&envelope).unwrap(),
        r#"{"status":"ERROR","error":"partial_order"}"#
    );

    // The single available unit is held for the customer.
    let listed = engine.list_orders_at(&basket, now).unwrap();
    assert_eq!(listed.items[0].quantity, 1);
    assert_eq!(
        engine
            .ledger()
            .stock_of(&"I-00001".parse().unwrap())
            .unwrap(),
        0
    );
}

#[test]
fn session_tokens_gate_every_entry_point() {
    let now = Utc::now();
    let engine = shop(now);

    // Expired session: the validator window closed an hour ago.
    let expired = engine.create_order_at(AUTH, now + Duration::hours(1));
    assert_eq!(
        serde_json::to_string(&Envelope::from_result(expired)).unwrap(),
        r#"{"status":"ERROR","error":"token_expired"}"#
    );

    // Unknown session token.
    let unknown = engine.create_order_at("3zQ74sSawCfWza05", now);
    assert_eq!(
        serde_json::to_string(&Envelope::from_result(unknown)).unwrap(),
        r#"{"status":"ERROR","error":"invalid_token"}"#
    );
}
