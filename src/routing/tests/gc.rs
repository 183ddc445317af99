use super::*;
use std::sync::Arc;
use tokio::time::sleep;

#[tokio::test]
async fn test_gc_removes_stale_forward_rules() {
    let table = Arc::new(MemoryTable::new(short_keep_alive(50)));

    let fwd = table.reserve_id().unwrap();
    let app = table.reserve_id().unwrap();
    table.save_rule(fwd, make_forward_rule(1)).unwrap();
    table.save_rule(app, make_app_rule(make_pk(), 80, 22)).unwrap();

    let gc = spawn_gc(Arc::clone(&table), Duration::from_millis(20));

    sleep(Duration::from_millis(200)).await;

    assert_eq!(table.count(), 1);
    assert!(matches!(table.rule(fwd), Err(RoutingError::RuleNotFound(_))));
    assert!(table.rule(app).is_ok());

    gc.stop().await;
}

#[tokio::test]
async fn test_gc_keeps_active_rules() {
    let table = Arc::new(MemoryTable::new(short_keep_alive(150)));
    let id = table.reserve_id().unwrap();
    table.save_rule(id, make_forward_rule(1)).unwrap();

    let gc = spawn_gc(Arc::clone(&table), Duration::from_millis(20));

    for _ in 0..5 {
        sleep(Duration::from_millis(50)).await;
        table.update_activity(id).unwrap();
    }

    assert!(table.rule(id).is_ok());
    gc.stop().await;
}

#[tokio::test]
async fn test_gc_stop_is_deterministic() {
    let table = Arc::new(MemoryTable::new(short_keep_alive(20)));
    let gc = spawn_gc(Arc::clone(&table), Duration::from_millis(10));

    sleep(Duration::from_millis(30)).await;
    assert!(!gc.is_finished());
    gc.stop().await;

    // Nothing sweeps after stop
    let id = table.reserve_id().unwrap();
    table.save_rule(id, make_forward_rule(1)).unwrap();
    sleep(Duration::from_millis(100)).await;

    assert_eq!(table.count(), 1);
    assert!(matches!(table.rule(id), Err(RoutingError::RuleTimedOut(_))));
}

#[tokio::test]
async fn test_gc_stops_when_handle_dropped() {
    let table = Arc::new(MemoryTable::new(short_keep_alive(20)));
    let gc = spawn_gc(Arc::clone(&table), Duration::from_millis(10));
    drop(gc);

    sleep(Duration::from_millis(30)).await;

    // The task held the only other reference to the table
    assert_eq!(Arc::strong_count(&table), 1);
}

#[tokio::test]
async fn test_gc_over_trait_object() {
    let table: Arc<dyn RoutingTable> = Arc::new(MemoryTable::new(short_keep_alive(30)));
    let id = table.reserve_id().unwrap();
    table.save_rule(id, make_forward_rule(1)).unwrap();

    let gc = spawn_gc(Arc::clone(&table), Duration::from_millis(10));
    sleep(Duration::from_millis(120)).await;

    assert_eq!(table.count(), 0);
    gc.stop().await;
}
