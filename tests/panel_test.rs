mod common;

use approvals_desk::cache::QueryCache;
use approvals_desk::model::{ItemKind, NotificationType, RelatedItem, RoleScope};
use approvals_desk::mutation::MarkRead;
use approvals_desk::panel::{Action, ApproveOutcome, NotificationPanel, PanelError};
use approvals_desk::query::NotificationQueries;
use common::{notification, ApprovalCall, RecordingBackend};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn panel(backend: &RecordingBackend, scope: RoleScope) -> NotificationPanel {
    let store = Arc::new(backend.clone());
    let cache = Arc::new(QueryCache::new(Duration::from_secs(20)));
    NotificationPanel::new(
        scope,
        NotificationQueries::new(store.clone(), cache.clone()),
        MarkRead::new(store.clone(), cache),
        store,
    )
}

#[tokio::test]
async fn admin_gets_approve_only_on_pending_items() {
    let backend = RecordingBackend::default();
    let admin = panel(&backend, RoleScope::Admin);
    let customer = panel(&backend, RoleScope::Customer("c1".into()));
    let pending = notification("n1", NotificationType::PriceListPendingApproval, None, 1);
    let approved = notification("n2", NotificationType::OrderApproved, Some("c1"), 2);

    assert_eq!(admin.actions(&pending), vec![Action::View, Action::Approve]);
    assert_eq!(admin.actions(&approved), vec![Action::View]);
    assert_eq!(customer.actions(&approved), vec![Action::View]);
    assert_eq!(customer.actions(&pending), vec![Action::View]);
}

#[tokio::test]
async fn approve_order_sets_status_then_marks_read() {
    let n = notification("n1", NotificationType::OrderPendingApproval, None, 1);
    let backend = RecordingBackend::with_docs(vec![n.clone()]);
    let admin = panel(&backend, RoleScope::Admin);
    assert_eq!(admin.unread_count().await.unwrap(), 1);

    let outcome = admin.approve(&n).await.unwrap();

    assert_eq!(outcome, ApproveOutcome::Approved);
    assert_eq!(
        backend.approval_calls().await,
        vec![ApprovalCall::OrderStatus {
            order_id: "item-n1".into(),
            status: "pending".into(),
        }]
    );
    assert!(backend.doc("n1").await.unwrap().is_read);
    assert!(!admin.is_approving("n1"));
    assert_eq!(admin.unread_count().await.unwrap(), 0);
}

#[tokio::test]
async fn approve_price_list_activates_it() {
    let n = notification("n7", NotificationType::PriceListPendingApproval, None, 1);
    let backend = RecordingBackend::with_docs(vec![n.clone()]);
    let admin = panel(&backend, RoleScope::Admin);

    admin.approve(&n).await.unwrap();

    assert_eq!(
        backend.approval_calls().await,
        vec![ApprovalCall::ActivatePriceList {
            price_list_id: "item-n7".into(),
        }]
    );
}

#[tokio::test]
async fn double_click_approve_issues_one_side_effect() {
    let n = notification("n1", NotificationType::OrderPendingApproval, None, 1);
    let backend = RecordingBackend::with_docs(vec![n.clone()]);
    let admin = panel(&backend, RoleScope::Admin);

    let (first, second) = tokio::join!(admin.approve(&n), admin.approve(&n));

    assert_eq!(first.unwrap(), ApproveOutcome::Approved);
    assert_eq!(second.unwrap(), ApproveOutcome::InFlight);
    assert_eq!(backend.approval_calls().await.len(), 1);
    assert_eq!(backend.mark_read_calls().await, vec!["n1"]);
    assert!(!admin.is_approving("n1"));
}

#[tokio::test]
async fn approve_is_admin_only() {
    let n = notification("n1", NotificationType::OrderPendingApproval, Some("s1"), 1);
    let backend = RecordingBackend::with_docs(vec![n.clone()]);
    let supplier = panel(&backend, RoleScope::Supplier("s1".into()));

    let err = supplier.approve(&n).await.unwrap_err();
    assert!(matches!(err, PanelError::NotAllowed { .. }));
    assert!(backend.approval_calls().await.is_empty());
}

#[tokio::test]
async fn failed_mark_read_after_approval_releases_the_guard() {
    let n = notification("n1", NotificationType::OrderPendingApproval, None, 1);
    let backend = RecordingBackend::with_docs(vec![n.clone()]);
    backend.set_fail_mark_read(true).await;
    let admin = panel(&backend, RoleScope::Admin);

    let err = admin.approve(&n).await.unwrap_err();
    assert!(matches!(err, PanelError::Remote(_)));
    assert!(!admin.is_approving("n1"));
    assert_eq!(admin.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn view_marks_read_then_navigates() {
    let n = notification("n2", NotificationType::PriceListApproved, Some("c1"), 1);
    let backend = RecordingBackend::with_docs(vec![n.clone()]);
    let customer = panel(&backend, RoleScope::Customer("c1".into()));
    let opened = Mutex::new(Vec::new());

    customer
        .view(&n, &|item: RelatedItem| opened.lock().unwrap().push(item))
        .await
        .unwrap();

    assert!(backend.doc("n2").await.unwrap().is_read);
    assert_eq!(
        *opened.lock().unwrap(),
        vec![RelatedItem { kind: ItemKind::PriceList, id: "item-n2".into() }]
    );
}

#[tokio::test]
async fn view_does_not_navigate_when_mark_read_fails() {
    let n = notification("n2", NotificationType::OrderApproved, Some("c1"), 1);
    let backend = RecordingBackend::with_docs(vec![n.clone()]);
    backend.set_fail_mark_read(true).await;
    let customer = panel(&backend, RoleScope::Customer("c1".into()));
    let opened = Mutex::new(Vec::<RelatedItem>::new());

    let res = customer
        .view(&n, &|item: RelatedItem| opened.lock().unwrap().push(item))
        .await;

    assert!(res.is_err());
    assert!(opened.lock().unwrap().is_empty());
}
