//! End-to-end coverage of the internal-order state machine: create, send,
//! convert to a counter-PO, approve, ship cascade, finish by creator, and
//! the legacy order-as-PO acceptance path.

mod common;

use assert_matches::assert_matches;
use common::{admin, kitchen, pimpinan, restaurant, supplier, TestApp};
use restosehat_api::errors::ServiceError;
use restosehat_api::services::orders::{CreateOrderRequest, OrderLine};

fn order_to(to_id: i64, items: &[(&str, i32)]) -> CreateOrderRequest {
    CreateOrderRequest {
        to_id,
        to_type: Some("branch".to_string()),
        from_id: None,
        items: items
            .iter()
            .map(|(item_id, qty)| OrderLine {
                item_id: item_id.to_string(),
                qty: *qty,
            })
            .collect(),
    }
}

#[tokio::test]
async fn full_order_to_po_lifecycle() {
    let mut app = TestApp::new().await;
    let branch_a = app.seed_branch("pusat").await;
    let branch_b = app.seed_branch("cabang").await;
    app.seed_item("BERAS-01", "Beras premium").await;
    app.seed_item("MINYAK-01", "Minyak goreng").await;

    let staff_a = restaurant(10, branch_a.id);
    let staff_b = restaurant(20, branch_b.id);

    // Branch A orders from branch B.
    let created = app
        .state
        .order_service
        .create_order(&staff_a, order_to(branch_b.id, &[("BERAS-01", 4), ("MINYAK-01", 2)]))
        .await
        .expect("create order");
    assert_eq!(created.order.status, "pending");
    assert_eq!(created.order.from_id, Some(branch_a.id));
    assert_eq!(created.items.len(), 2);
    app.wait_for_event("order_created").await;

    let order_id = created.order.id;

    // Only the creating branch's restaurant staff can send.
    let err = app
        .state
        .order_service
        .send_order(&staff_b, order_id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));
    let err = app
        .state
        .order_service
        .send_order(&kitchen(11, branch_a.id), order_id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    app.state
        .order_service
        .send_order(&staff_a, order_id)
        .await
        .expect("send order");
    let sent = app.state.order_service.get_order(order_id).await.unwrap();
    assert_eq!(sent.order.status, "menunggu");
    assert!(sent.order.shipped_at.is_some());
    app.wait_for_event("order_kirim").await;

    // Sending twice is a state conflict, not a permission problem.
    let err = app
        .state
        .order_service
        .send_order(&staff_a, order_id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    // Only the receiver converts the waiting order into a counter-PO.
    let err = app
        .state
        .order_service
        .convert_to_po(&staff_a, order_id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    let po = app
        .state
        .order_service
        .convert_to_po(&staff_b, order_id)
        .await
        .expect("convert to po");
    assert_eq!(po.status, "PENDING");
    assert_eq!(po.orig_order_id, Some(order_id));
    assert_eq!(po.to_branch, Some(branch_a.id));
    assert_eq!(po.branch_id, Some(branch_b.id));
    app.wait_for_event("po_back_created").await;

    let po_detail = app
        .state
        .purchase_order_service
        .get_purchase_order(po.id)
        .await
        .unwrap();
    assert_eq!(po_detail.items.len(), 2);
    assert!(po_detail.items.iter().all(|i| i.unit_price.is_none()));

    // The order itself stays waiting.
    let after_convert = app.state.order_service.get_order(order_id).await.unwrap();
    assert_eq!(after_convert.order.status, "menunggu");

    // Approval belongs to the branch that created the original order.
    let err = app
        .state
        .purchase_order_service
        .approve(&staff_b, po.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    app.state
        .purchase_order_service
        .approve(&staff_a, po.id)
        .await
        .expect("approve po");
    app.wait_for_event("po_approved").await;

    // Internal-transfer PO ships only by its creator.
    let err = app
        .state
        .purchase_order_service
        .ship(&staff_a, po.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    app.state
        .purchase_order_service
        .ship(&staff_b, po.id)
        .await
        .expect("ship po");
    app.wait_for_event("po_shipped").await;

    // Shipping cascades the originating order to dikirimkan.
    let cascaded = app.state.order_service.get_order(order_id).await.unwrap();
    assert_eq!(cascaded.order.status, "dikirimkan");

    // Finish settles the stock into the creating branch's ledger.
    let err = app
        .state
        .order_service
        .finish_by_creator(&staff_b, order_id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    app.state
        .order_service
        .finish_by_creator(&staff_a, order_id)
        .await
        .expect("finish order");
    app.wait_for_event("order_finished_by_creator").await;

    let finished = app.state.order_service.get_order(order_id).await.unwrap();
    assert_eq!(finished.order.status, "selesai");
    assert!(finished.order.received_at.is_some());

    // Entries were created lazily with the default reorder level.
    let rows = app
        .state
        .inventory_service
        .get_branch_inventory(&staff_a, branch_a.id)
        .await
        .unwrap();
    let beras = rows.iter().find(|r| r.item_id == "BERAS-01").unwrap();
    assert_eq!(beras.qty, 4);
    assert_eq!(beras.reorder_level, 5);
    let minyak = rows.iter().find(|r| r.item_id == "MINYAK-01").unwrap();
    assert_eq!(minyak.qty, 2);

    // Finishing twice conflicts.
    let err = app
        .state
        .order_service
        .finish_by_creator(&staff_a, order_id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn legacy_accept_po_cascades_counter_order() {
    let app = TestApp::new().await;
    let branch_a = app.seed_branch("pusat").await;
    let branch_b = app.seed_branch("cabang").await;
    app.seed_item("GULA-01", "Gula pasir").await;

    let staff_a = restaurant(10, branch_a.id);
    let staff_b = restaurant(20, branch_b.id);

    // A -> B, sent and waiting.
    let outbound = app
        .state
        .order_service
        .create_order(&staff_a, order_to(branch_b.id, &[("GULA-01", 3)]))
        .await
        .unwrap();
    app.state
        .order_service
        .send_order(&staff_a, outbound.order.id)
        .await
        .unwrap();

    // B -> A, pending; treated as the legacy order-as-PO.
    let inbound = app
        .state
        .order_service
        .create_order(&staff_b, order_to(branch_a.id, &[("GULA-01", 3)]))
        .await
        .unwrap();

    // Only the addressed branch can accept.
    let err = app
        .state
        .order_service
        .accept_po(&staff_b, inbound.order.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    app.state
        .order_service
        .accept_po(&staff_a, inbound.order.id)
        .await
        .expect("accept po");

    let accepted = app
        .state
        .order_service
        .get_order(inbound.order.id)
        .await
        .unwrap();
    assert_eq!(accepted.order.status, "received_po");
    assert!(accepted.order.received_at.is_some());

    // The waiting counter-order started shipping.
    let cascaded = app
        .state
        .order_service
        .get_order(outbound.order.id)
        .await
        .unwrap();
    assert_eq!(cascaded.order.status, "dikirimkan");
    assert!(cascaded.order.shipped_at.is_some());

    // Accepting again conflicts.
    let err = app
        .state
        .order_service
        .accept_po(&staff_a, inbound.order.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn order_listing_is_role_gated() {
    let app = TestApp::new().await;
    let branch_a = app.seed_branch("pusat").await;
    let branch_b = app.seed_branch("cabang").await;
    app.seed_item("TEPUNG-01", "Tepung terigu").await;

    let staff_a = restaurant(10, branch_a.id);
    let staff_b = restaurant(20, branch_b.id);
    let supplier_actor = supplier(77);

    let to_branch = app
        .state
        .order_service
        .create_order(&staff_a, order_to(branch_b.id, &[("TEPUNG-01", 2)]))
        .await
        .unwrap();
    let to_supplier = app
        .state
        .order_service
        .create_order(
            &staff_a,
            CreateOrderRequest {
                to_id: 77,
                to_type: Some("supplier".to_string()),
                from_id: None,
                items: vec![OrderLine {
                    item_id: "TEPUNG-01".to_string(),
                    qty: 5,
                }],
            },
        )
        .await
        .unwrap();

    // Creator sees both outgoing orders.
    let mine = app.state.order_service.list_orders(&staff_a).await.unwrap();
    assert_eq!(mine.len(), 2);

    // Receiver branch sees nothing while the order is still pending.
    let theirs = app.state.order_service.list_orders(&staff_b).await.unwrap();
    assert!(theirs.is_empty());

    // Supplier sees nothing pending either.
    let supplied = app
        .state
        .order_service
        .list_orders(&supplier_actor)
        .await
        .unwrap();
    assert!(supplied.is_empty());

    app.state
        .order_service
        .send_order(&staff_a, to_branch.order.id)
        .await
        .unwrap();
    app.state
        .order_service
        .send_order(&staff_a, to_supplier.order.id)
        .await
        .unwrap();

    let theirs = app.state.order_service.list_orders(&staff_b).await.unwrap();
    assert_eq!(theirs.len(), 1);
    assert_eq!(theirs[0].id, to_branch.order.id);

    let supplied = app
        .state
        .order_service
        .list_orders(&supplier_actor)
        .await
        .unwrap();
    assert_eq!(supplied.len(), 1);
    assert_eq!(supplied[0].id, to_supplier.order.id);

    // Executive view is read-only but sees everything.
    let overview = app
        .state
        .order_service
        .list_orders(&pimpinan(99))
        .await
        .unwrap();
    assert_eq!(overview.len(), 2);
}

#[tokio::test]
async fn admin_authors_order_for_named_branch() {
    let app = TestApp::new().await;
    let branch_a = app.seed_branch("pusat").await;
    let branch_b = app.seed_branch("cabang").await;
    app.seed_item("BERAS-01", "Beras premium").await;

    let staff_a = restaurant(10, branch_a.id);

    // Admin names the authoring branch; that branch's staff run the
    // lifecycle from there.
    let created = app
        .state
        .order_service
        .create_order(
            &admin(1),
            CreateOrderRequest {
                to_id: branch_b.id,
                to_type: Some("branch".to_string()),
                from_id: Some(branch_a.id),
                items: vec![OrderLine {
                    item_id: "BERAS-01".to_string(),
                    qty: 2,
                }],
            },
        )
        .await
        .expect("admin creates order");
    assert_eq!(created.order.from_id, Some(branch_a.id));

    app.state
        .order_service
        .send_order(&staff_a, created.order.id)
        .await
        .expect("named branch sends");

    // Branch staff cannot author from a foreign branch.
    let err = app
        .state
        .order_service
        .create_order(
            &staff_a,
            CreateOrderRequest {
                to_id: branch_b.id,
                to_type: Some("branch".to_string()),
                from_id: Some(branch_b.id),
                items: vec![OrderLine {
                    item_id: "BERAS-01".to_string(),
                    qty: 2,
                }],
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));
}

#[tokio::test]
async fn branch_kitchen_can_approve_and_accept() {
    let app = TestApp::new().await;
    let branch_a = app.seed_branch("pusat").await;
    let branch_b = app.seed_branch("cabang").await;
    app.seed_item("GULA-01", "Gula pasir").await;

    let staff_a = restaurant(10, branch_a.id);
    let staff_b = restaurant(20, branch_b.id);

    // A -> B, converted into a counter-PO by the receiver.
    let outbound = app
        .state
        .order_service
        .create_order(&staff_a, order_to(branch_b.id, &[("GULA-01", 3)]))
        .await
        .unwrap();
    app.state
        .order_service
        .send_order(&staff_a, outbound.order.id)
        .await
        .unwrap();
    let po = app
        .state
        .order_service
        .convert_to_po(&staff_b, outbound.order.id)
        .await
        .unwrap();

    // Approval is gated on branch identity, not the restaurant role.
    let err = app
        .state
        .purchase_order_service
        .approve(&kitchen(21, branch_b.id), po.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));
    app.state
        .purchase_order_service
        .approve(&kitchen(11, branch_a.id), po.id)
        .await
        .expect("kitchen of the authoring branch approves");

    // Same for the legacy acceptance path.
    let inbound = app
        .state
        .order_service
        .create_order(&staff_b, order_to(branch_a.id, &[("GULA-01", 3)]))
        .await
        .unwrap();
    let err = app
        .state
        .order_service
        .accept_po(&supplier(77), inbound.order.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));
    app.state
        .order_service
        .accept_po(&kitchen(11, branch_a.id), inbound.order.id)
        .await
        .expect("kitchen of the addressed branch accepts");

    let accepted = app
        .state
        .order_service
        .get_order(inbound.order.id)
        .await
        .unwrap();
    assert_eq!(accepted.order.status, "received_po");
}

#[tokio::test]
async fn order_creation_validation() {
    let app = TestApp::new().await;
    let branch_a = app.seed_branch("pusat").await;
    let staff_a = restaurant(10, branch_a.id);

    let err = app
        .state
        .order_service
        .create_order(&staff_a, order_to(2, &[]))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let err = app
        .state
        .order_service
        .create_order(&staff_a, order_to(2, &[("beras putih", 1)]))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let err = app
        .state
        .order_service
        .create_order(&staff_a, order_to(2, &[("BERAS-01", 0)]))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    // Creation itself is open to any authenticated actor; without a named
    // branch the order simply has no authoring branch.
    let created = app
        .state
        .order_service
        .create_order(&pimpinan(99), order_to(2, &[("BERAS-01", 1)]))
        .await
        .expect("pimpinan creates");
    assert_eq!(created.order.from_id, None);
}
