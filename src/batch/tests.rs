use super::*;
use crate::command::{CorrelatorConfig, ReplyEnvelope};
use crate::model::{Device, EntityAddress, Gateway, Group};
use crate::testing::RecordingPublisher;
use serde_json::json;
use tokio::time::Instant;

struct Fixture {
    publisher: Arc<RecordingPublisher>,
    correlator: Arc<Correlator>,
    batcher: Arc<Batcher>,
}

fn fixture() -> Fixture {
    let publisher = Arc::new(RecordingPublisher::new());
    let correlator = Arc::new(Correlator::new(
        publisher.clone(),
        CorrelatorConfig {
            command_subject: "tradfri-cmd".to_string(),
            reply_subject: "tradfri-reply.test".to_string(),
            timeout: Duration::from_secs(10),
        },
    ));
    let batcher = Arc::new(Batcher::new(correlator.clone(), DEFAULT_BATCH_WINDOW));
    Fixture {
        publisher,
        correlator,
        batcher,
    }
}

fn ack(correlator: &Correlator, id: &str) {
    correlator.deliver(ReplyEnvelope {
        id: id.to_string(),
        code: "2.04".to_string(),
        ..Default::default()
    });
}

fn device(id: i64) -> Arc<EntityHandle<Device>> {
    Arc::new(EntityHandle::new(EntityAddress::device(id)))
}

#[tokio::test(start_paused = true)]
async fn test_mutations_in_one_window_produce_one_write() {
    let f = fixture();
    let lamp = device(65537);

    f.batcher.mutate(&lamp, |d| d.light_mut().setting.dimmable.set_on(true));
    f.batcher.mutate(&lamp, |d| d.light_mut().setting.dimmable.dim = Some(100));
    f.batcher.mutate(&lamp, |d| d.base.name = "Lamp".to_string());

    let request = f.publisher.next_request().await;
    assert_eq!(request.url, "15001/65537");
    assert_eq!(
        request.payload,
        Some(json!({"9001": "Lamp", "3311": [{"5850": 1, "5851": 100}]}))
    );
    ack(&f.correlator, &request.id);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(f.publisher.requests().len(), 1);
    assert_eq!(f.batcher.stats(), BatchStats { flushed: 1, failed: 0 });
    assert!(!lamp.has_pending());
}

#[tokio::test(start_paused = true)]
async fn test_same_field_keeps_latest_value() {
    let f = fixture();
    let lamp = device(65537);

    f.batcher.mutate(&lamp, |d| d.light_mut().setting.dimmable.dim = Some(10));
    f.batcher.mutate(&lamp, |d| d.light_mut().setting.dimmable.dim = Some(200));

    let request = f.publisher.next_request().await;
    assert_eq!(request.payload, Some(json!({"3311": [{"5851": 200}]})));
}

#[tokio::test(start_paused = true)]
async fn test_window_is_not_extended_by_later_calls() {
    let f = fixture();
    let lamp = device(65537);
    let start = Instant::now();

    f.batcher.mutate(&lamp, |d| d.light_mut().setting.dimmable.set_on(false));
    tokio::time::sleep(Duration::from_millis(40)).await;
    f.batcher.mutate(&lamp, |d| d.base.name = "Desk".to_string());

    let request = f.publisher.next_request().await;

    assert_eq!(start.elapsed(), DEFAULT_BATCH_WINDOW);
    assert_eq!(
        request.payload,
        Some(json!({"9001": "Desk", "3311": [{"5850": 0}]}))
    );
}

#[tokio::test(start_paused = true)]
async fn test_mutation_after_flush_opens_new_batch() {
    let f = fixture();
    let lamp = device(65537);

    f.batcher.mutate(&lamp, |d| d.light_mut().setting.dimmable.set_on(true));
    let first = f.publisher.next_request().await;
    ack(&f.correlator, &first.id);

    f.batcher.mutate(&lamp, |d| d.light_mut().setting.dimmable.set_on(false));
    let second = f.publisher.next_request().await;

    assert_ne!(first.id, second.id);
    assert_eq!(second.payload, Some(json!({"3311": [{"5850": 0}]})));
}

#[tokio::test(start_paused = true)]
async fn test_batches_are_per_entity() {
    let f = fixture();
    let lamp = device(1);
    let room: Arc<EntityHandle<Group>> = Arc::new(EntityHandle::new(EntityAddress::group(2)));

    f.batcher.mutate(&lamp, |d| d.base.name = "Lamp".to_string());
    f.batcher.mutate(&room, |g| g.dimmable.set_on(true));

    let mut urls = vec![
        f.publisher.next_request().await.url,
        f.publisher.next_request().await.url,
    ];
    urls.sort();

    assert_eq!(urls, vec!["15001/1", "15004/2"]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_submission_is_dropped() {
    let f = fixture();
    f.publisher.fail();
    let lamp = device(65537);

    f.batcher.mutate(&lamp, |d| d.base.name = "Lamp".to_string());
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(f.batcher.stats(), BatchStats { flushed: 0, failed: 1 });
    assert!(!lamp.has_pending());
    assert_eq!(f.correlator.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_gateway_write_carries_only_touched_fields() {
    let f = fixture();
    let gateway = Arc::new(EntityHandle::<Gateway>::new(EntityAddress::gateway()));

    f.batcher.mutate(&gateway, |g| g.name = "Hub".to_string());

    let request = f.publisher.next_request().await;
    assert_eq!(request.url, "15011/15012");
    assert_eq!(request.payload, Some(json!({"9035": "Hub"})));
    ack(&f.correlator, &request.id);
}
