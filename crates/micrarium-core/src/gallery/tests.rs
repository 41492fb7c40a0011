use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::Value;
use tokio::sync::Notify;

use super::*;
use crate::error::{Error, ServiceError, TransportError};
use crate::record::fields;

/// Lets a test freeze the next page fetch mid-flight.
struct Gate {
    armed: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl Gate {
    fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    async fn pass(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }

    async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    fn open(&self) {
        self.release.notify_one();
    }
}

struct MockStore {
    slides: Mutex<Vec<SlideRecord>>,
    gate: Gate,
    fail_fetch: AtomicBool,
    fail_count: AtomicBool,
    absent_fields: Mutex<HashSet<String>>,
    denied_fields: Mutex<HashSet<String>>,
    patches: Mutex<Vec<(SlideId, String, Value)>>,
}

impl MockStore {
    fn with_slides(slides: Vec<SlideRecord>) -> Arc<Self> {
        Arc::new(Self {
            slides: Mutex::new(slides),
            gate: Gate::new(),
            fail_fetch: AtomicBool::new(false),
            fail_count: AtomicBool::new(false),
            absent_fields: Mutex::new(HashSet::new()),
            denied_fields: Mutex::new(HashSet::new()),
            patches: Mutex::new(Vec::new()),
        })
    }

    fn mark_absent(&self, field: &str) {
        self.absent_fields.lock().unwrap().insert(field.to_string());
    }

    fn deny(&self, field: &str) {
        self.denied_fields.lock().unwrap().insert(field.to_string());
    }

    fn slide(&self, id: &str) -> SlideRecord {
        self.slides
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id.as_str() == id)
            .cloned()
            .unwrap()
    }

    fn push(&self, slide: SlideRecord) {
        self.slides.lock().unwrap().push(slide);
    }

    fn patch_count(&self) -> usize {
        self.patches.lock().unwrap().len()
    }
}

#[async_trait]
impl SlideStore for MockStore {
    async fn count(&self, filter: &SlideFilter) -> Result<u64> {
        if self.fail_count.load(Ordering::SeqCst) {
            return Err(Error::Transport(TransportError::Connection {
                message: "connection refused".to_string(),
            }));
        }
        let slides = self.slides.lock().unwrap();
        Ok(slides.iter().filter(|r| r.matches(filter)).count() as u64)
    }

    async fn fetch_page(
        &self,
        filter: &SlideFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<SlideRecord>> {
        self.gate.pass().await;
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(Error::Transport(TransportError::Connection {
                message: "connection refused".to_string(),
            }));
        }
        let slides = self.slides.lock().unwrap();
        let mut matching: Vec<SlideRecord> =
            slides.iter().filter(|r| r.matches(filter)).cloned().collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_str().cmp(a.id.as_str()))
        });
        Ok(matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn fetch_record(&self, id: &SlideId) -> Result<SlideRecord> {
        let slides = self.slides.lock().unwrap();
        slides.iter().find(|r| &r.id == id).cloned().ok_or_else(|| {
            Error::Service(ServiceError::new(
                404,
                Some("PGRST116".to_string()),
                Some("The result contains 0 rows".to_string()),
            ))
        })
    }

    async fn patch_attribute(&self, id: &SlideId, field: &str, value: Value) -> Result<()> {
        if self.absent_fields.lock().unwrap().contains(field) {
            return Err(Error::Service(ServiceError::new(
                400,
                Some("42703".to_string()),
                Some(format!(
                    "column \"{field}\" of relation \"slides\" does not exist"
                )),
            )));
        }
        if self.denied_fields.lock().unwrap().contains(field) {
            return Err(Error::Service(ServiceError::new(
                403,
                Some("42501".to_string()),
                Some("permission denied for table slides".to_string()),
            )));
        }
        let mut slides = self.slides.lock().unwrap();
        let record = slides.iter_mut().find(|r| &r.id == id).ok_or_else(|| {
            Error::Service(ServiceError::new(
                404,
                Some("PGRST116".to_string()),
                Some("The result contains 0 rows".to_string()),
            ))
        })?;
        apply_patch(record, field, &value);
        self.patches
            .lock()
            .unwrap()
            .push((id.clone(), field.to_string(), value));
        Ok(())
    }

    fn resolve_public_url(&self, storage_path: &str) -> Option<String> {
        Some(format!("https://mock.test/storage/{storage_path}"))
    }
}

fn apply_patch(record: &mut SlideRecord, field: &str, value: &Value) {
    match field {
        fields::CATEGORIES => record.categories = string_list(value),
        fields::CATEGORY => record.category = value.as_str().map(str::to_owned),
        fields::COLORS => record.colors = string_list(value),
        fields::COLOR => record.color = value.as_str().map(str::to_owned),
        fields::NOTES => record.notes = value.as_str().map(str::to_owned),
        fields::FEATURED => record.featured = value.as_bool().unwrap_or(false),
        other => panic!("patch against unexpected field {other}"),
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value.as_array().map(|items| {
        items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_owned))
            .collect()
    })
}

fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn id(s: &str) -> SlideId {
    SlideId::new(s).unwrap()
}

fn bleb(slide_id: &str, color: &str, minute: u32) -> SlideRecord {
    SlideRecord {
        id: id(slide_id),
        categories: Some(labels(&["Blebs"])),
        category: Some("Blebs".to_string()),
        colors: Some(labels(&[color])),
        color: Some(color.to_string()),
        notes: None,
        featured: false,
        storage_path: format!("public/{slide_id}.jpg"),
        created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, minute, 0).unwrap(),
    }
}

/// A slide written before the multi-valued schema existed.
fn legacy_bleb(slide_id: &str, color: &str, minute: u32) -> SlideRecord {
    SlideRecord {
        id: id(slide_id),
        categories: None,
        category: Some("Blebs".to_string()),
        colors: None,
        color: Some(color.to_string()),
        notes: None,
        featured: false,
        storage_path: format!("public/{slide_id}.jpg"),
        created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, minute, 0).unwrap(),
    }
}

/// Five Blebs slides, oldest to newest.
fn scenario_slides() -> Vec<SlideRecord> {
    vec![
        bleb("s1", "Clear", 1),
        bleb("s2", "Red", 2),
        bleb("s3", "Clear", 3),
        bleb("s4", "Brown", 4),
        bleb("s5", "Yellow", 5),
    ]
}

fn gallery_over(store: Arc<MockStore>, page_size: u64) -> Gallery {
    let config = GalleryConfig::new("Blebs")
        .unwrap()
        .with_page_size(page_size)
        .unwrap();
    Gallery::new(store, config)
}

async fn loaded_colors(gallery: &Gallery) -> Vec<String> {
    gallery
        .records()
        .await
        .iter()
        .map(|r| r.effective_colors().first().cloned().unwrap())
        .collect()
}

#[tokio::test]
async fn starts_idle_before_first_fetch() {
    let gallery = gallery_over(MockStore::with_slides(scenario_slides()), 2);
    assert_eq!(gallery.status().await, GalleryStatus::Idle);
    assert!(gallery.records().await.is_empty());
    assert_eq!(gallery.count().await, None);
}

#[tokio::test]
async fn paginates_newest_first_until_exhausted() {
    let gallery = gallery_over(MockStore::with_slides(scenario_slides()), 2);

    assert_eq!(
        gallery.refresh().await.unwrap(),
        PageLoad::Fetched {
            added: 2,
            more: true
        }
    );
    assert_eq!(loaded_colors(&gallery).await, labels(&["Yellow", "Brown"]));
    assert_eq!(gallery.count().await, Some(5));

    assert_eq!(
        gallery.load_next_page().await.unwrap(),
        PageLoad::Fetched {
            added: 2,
            more: true
        }
    );
    assert_eq!(
        loaded_colors(&gallery).await,
        labels(&["Yellow", "Brown", "Clear", "Red"])
    );

    assert_eq!(
        gallery.load_next_page().await.unwrap(),
        PageLoad::Fetched {
            added: 1,
            more: false
        }
    );
    assert_eq!(
        loaded_colors(&gallery).await,
        labels(&["Yellow", "Brown", "Clear", "Red", "Clear"])
    );
    assert!(!gallery.has_more().await);

    // The sequence is complete; a further call is a no-op.
    assert_eq!(gallery.load_next_page().await.unwrap(), PageLoad::Skipped);
    assert_eq!(gallery.records().await.len(), 5);
    assert_eq!(
        gallery.status().await,
        GalleryStatus::Loaded {
            shown: 5,
            total: Some(5)
        }
    );
}

#[tokio::test]
async fn color_filter_restricts_and_recounts() {
    let gallery = gallery_over(MockStore::with_slides(scenario_slides()), 2);
    gallery.refresh().await.unwrap();
    while gallery.has_more().await {
        gallery.load_next_page().await.unwrap();
    }

    assert_eq!(
        gallery.set_color_filter(Some("Clear")).await.unwrap(),
        PageLoad::Fetched {
            added: 2,
            more: true
        }
    );
    let records = gallery.records().await;
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["s3", "s1"]);
    assert_eq!(gallery.count().await, Some(2));

    // An exact page-size hit needs one more fetch to learn it is done.
    assert_eq!(
        gallery.load_next_page().await.unwrap(),
        PageLoad::Fetched {
            added: 0,
            more: false
        }
    );
    assert_eq!(gallery.records().await.len(), 2);
}

#[tokio::test]
async fn changing_filter_discards_previous_results() {
    let gallery = gallery_over(MockStore::with_slides(scenario_slides()), 2);

    gallery.set_color_filter(Some("Red")).await.unwrap();
    assert_eq!(loaded_colors(&gallery).await, labels(&["Red"]));

    gallery.set_color_filter(Some("Brown")).await.unwrap();
    assert_eq!(loaded_colors(&gallery).await, labels(&["Brown"]));
    assert_eq!(gallery.count().await, Some(1));
}

#[tokio::test]
async fn clearing_filter_restores_unrestricted_view() {
    let gallery = gallery_over(MockStore::with_slides(scenario_slides()), 2);

    gallery.set_color_filter(Some("Clear")).await.unwrap();
    assert_eq!(gallery.count().await, Some(2));

    gallery.set_color_filter(None).await.unwrap();
    while gallery.has_more().await {
        gallery.load_next_page().await.unwrap();
    }
    assert_eq!(gallery.records().await.len(), 5);
    assert_eq!(gallery.count().await, Some(5));
    assert_eq!(gallery.color_filter().await, None);
}

#[tokio::test]
async fn stale_page_response_is_discarded() {
    let store = MockStore::with_slides(scenario_slides());
    let gallery = gallery_over(Arc::clone(&store), 2);
    gallery.refresh().await.unwrap();

    store.gate.arm();
    let pending = {
        let gallery = gallery.clone();
        tokio::spawn(async move { gallery.load_next_page().await })
    };
    store.gate.wait_entered().await;

    // The filter moves on while the old fetch is suspended.
    gallery.set_color_filter(Some("Clear")).await.unwrap();
    store.gate.open();

    assert_eq!(pending.await.unwrap().unwrap(), PageLoad::Discarded);
    let records = gallery.records().await;
    assert_eq!(records.len(), 2);
    assert!(records
        .iter()
        .all(|r| r.effective_colors().contains(&"Clear".to_string())));
    assert_eq!(gallery.count().await, Some(2));
}

#[tokio::test]
async fn only_one_page_fetch_in_flight() {
    let store = MockStore::with_slides(scenario_slides());
    let gallery = gallery_over(Arc::clone(&store), 2);
    gallery.refresh().await.unwrap();

    store.gate.arm();
    let pending = {
        let gallery = gallery.clone();
        tokio::spawn(async move { gallery.load_next_page().await })
    };
    store.gate.wait_entered().await;

    assert_eq!(gallery.load_next_page().await.unwrap(), PageLoad::Skipped);
    assert_eq!(gallery.status().await, GalleryStatus::Loading);

    store.gate.open();
    assert_eq!(
        pending.await.unwrap().unwrap(),
        PageLoad::Fetched {
            added: 2,
            more: true
        }
    );
}

#[tokio::test]
async fn failed_load_is_distinct_from_no_results() {
    let store = MockStore::with_slides(scenario_slides());
    let gallery = gallery_over(Arc::clone(&store), 2);

    store.fail_fetch.store(true, Ordering::SeqCst);
    let err = gallery.refresh().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert!(matches!(gallery.status().await, GalleryStatus::Failed(_)));
    assert!(gallery.records().await.is_empty());
    assert!(!gallery.has_more().await);

    // Pagination stays stopped until the filter is reloaded.
    assert_eq!(gallery.load_next_page().await.unwrap(), PageLoad::Skipped);

    // Reloading is the manual retry path.
    store.fail_fetch.store(false, Ordering::SeqCst);
    gallery.refresh().await.unwrap();
    assert!(matches!(
        gallery.status().await,
        GalleryStatus::Loaded { shown: 2, .. }
    ));

    // An empty gallery that fetched successfully looks different.
    let empty = gallery_over(MockStore::with_slides(Vec::new()), 2);
    empty.refresh().await.unwrap();
    assert_eq!(empty.status().await, GalleryStatus::NoResults);
}

#[tokio::test]
async fn count_failure_leaves_total_unresolved() {
    let store = MockStore::with_slides(scenario_slides());
    store.fail_count.store(true, Ordering::SeqCst);
    let gallery = gallery_over(Arc::clone(&store), 2);

    // The page fetch does not block on the count.
    assert_eq!(
        gallery.refresh().await.unwrap(),
        PageLoad::Fetched {
            added: 2,
            more: true
        }
    );
    assert_eq!(gallery.count().await, None);
    assert!(gallery.has_more().await);
    assert_eq!(
        gallery.status().await,
        GalleryStatus::Loaded {
            shown: 2,
            total: None
        }
    );

    // Asking for the count directly surfaces the failure.
    assert!(gallery.refresh_count().await.is_err());

    store.fail_count.store(false, Ordering::SeqCst);
    assert_eq!(gallery.refresh_count().await.unwrap(), Some(5));
    assert_eq!(gallery.count().await, Some(5));
}

#[tokio::test]
async fn refresh_count_tracks_new_uploads() {
    let store = MockStore::with_slides(scenario_slides());
    let gallery = gallery_over(Arc::clone(&store), 2);
    gallery.refresh().await.unwrap();
    assert_eq!(gallery.count().await, Some(5));

    store.push(bleb("s6", "Red", 6));
    assert_eq!(gallery.refresh_count().await.unwrap(), Some(6));
    assert_eq!(gallery.count().await, Some(6));
}

#[tokio::test]
async fn rejects_color_outside_vocabulary() {
    let gallery = gallery_over(MockStore::with_slides(scenario_slides()), 2);
    gallery.refresh().await.unwrap();

    let err = gallery.set_color_filter(Some("Purple")).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    // The rejected filter never touched the loaded sequence.
    assert_eq!(gallery.records().await.len(), 2);
}

#[tokio::test]
async fn dual_write_is_idempotent() {
    let store = MockStore::with_slides(scenario_slides());
    let gallery = gallery_over(Arc::clone(&store), 2);

    let set = labels(&["Blebs", "Fibers"]);
    gallery.set_categories(&id("s1"), &set).await.unwrap();
    let once = store.slide("s1");
    gallery.set_categories(&id("s1"), &set).await.unwrap();
    let twice = store.slide("s1");

    assert_eq!(once.effective_categories(), twice.effective_categories());
    assert_eq!(twice.effective_categories(), labels(&["Blebs", "Fibers"]));
    assert_eq!(twice.category.as_deref(), Some("Blebs"));

    // Both representations were written on each call.
    assert_eq!(store.patch_count(), 4);
}

#[tokio::test]
async fn duplicate_labels_collapse_before_write() {
    let store = MockStore::with_slides(scenario_slides());
    let gallery = gallery_over(Arc::clone(&store), 2);

    gallery
        .set_categories(&id("s1"), &labels(&["Blebs", "Fibers", "Blebs"]))
        .await
        .unwrap();

    let stored = store.slide("s1");
    assert_eq!(stored.categories, Some(labels(&["Blebs", "Fibers"])));
    assert_eq!(stored.category.as_deref(), Some("Blebs"));
}

#[tokio::test]
async fn legacy_only_slide_round_trips() {
    let store = MockStore::with_slides(vec![legacy_bleb("old1", "Red", 1)]);
    let gallery = gallery_over(Arc::clone(&store), 2);

    gallery.refresh().await.unwrap();
    let records = gallery.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].effective_categories(), labels(&["Blebs"]));
    assert_eq!(records[0].effective_colors(), labels(&["Red"]));

    gallery
        .set_colors(&id("old1"), &labels(&["Yellow", "Brown"]))
        .await
        .unwrap();
    let stored = store.slide("old1");
    assert_eq!(stored.colors, Some(labels(&["Yellow", "Brown"])));
    assert_eq!(stored.color.as_deref(), Some("Yellow"));
}

#[tokio::test]
async fn schema_absence_tolerated_on_multi_column() {
    let store = MockStore::with_slides(vec![legacy_bleb("old1", "Red", 1)]);
    store.mark_absent(fields::COLORS);
    let gallery = gallery_over(Arc::clone(&store), 2);

    gallery
        .set_colors(&id("old1"), &labels(&["Brown"]))
        .await
        .unwrap();

    // The legacy column carried the write alone.
    let stored = store.slide("old1");
    assert_eq!(stored.colors, None);
    assert_eq!(stored.color.as_deref(), Some("Brown"));
}

#[tokio::test]
async fn schema_absence_tolerated_on_legacy_column() {
    let store = MockStore::with_slides(scenario_slides());
    store.mark_absent(fields::COLOR);
    let gallery = gallery_over(Arc::clone(&store), 2);

    gallery
        .set_colors(&id("s1"), &labels(&["Brown"]))
        .await
        .unwrap();

    let stored = store.slide("s1");
    assert_eq!(stored.colors, Some(labels(&["Brown"])));
    assert_eq!(stored.color.as_deref(), Some("Red"));
}

#[tokio::test]
async fn fatal_write_failure_mutates_nothing_locally() {
    let store = MockStore::with_slides(scenario_slides());
    store.deny(fields::CATEGORIES);
    let gallery = gallery_over(Arc::clone(&store), 2);
    gallery.refresh().await.unwrap();

    let err = gallery
        .set_categories(&id("s5"), &labels(&["Fibers"]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Service(ref e) if !e.is_schema_absence()));

    // The effective set is unchanged; the multi-valued column rejected
    // the write and it wins on read.
    assert_eq!(store.slide("s5").effective_categories(), labels(&["Blebs"]));
    // The legacy write was still attempted, per the unconditional
    // dual-write rule.
    assert_eq!(store.slide("s5").category.as_deref(), Some("Fibers"));

    // The loaded copy was not optimistically updated.
    let records = gallery.records().await;
    assert_eq!(records[0].id.as_str(), "s5");
    assert_eq!(records[0].effective_categories(), labels(&["Blebs"]));
}

#[tokio::test]
async fn prompts_for_colors_when_gaining_color_bearing_category() {
    let mut fiber = bleb("f1", "Red", 1);
    fiber.categories = Some(labels(&["Fibers"]));
    fiber.category = Some("Fibers".to_string());
    fiber.colors = None;
    fiber.color = None;

    let store = MockStore::with_slides(vec![fiber]);
    let editor = SlideEditor::new(Arc::clone(&store) as Arc<dyn SlideStore>);

    let outcome = editor
        .set_categories(&id("f1"), &labels(&["Fibers", "Blebs"]))
        .await
        .unwrap();
    assert!(outcome.prompt_colors);

    // Already color-bearing: no repeat prompt.
    let outcome = editor
        .set_categories(&id("f1"), &labels(&["Blebs"]))
        .await
        .unwrap();
    assert!(!outcome.prompt_colors);
}

#[tokio::test]
async fn no_color_prompt_when_colors_already_set() {
    let mut slide = bleb("s1", "Red", 1);
    slide.categories = Some(labels(&["Fibers"]));
    slide.category = Some("Fibers".to_string());

    let store = MockStore::with_slides(vec![slide]);
    let editor = SlideEditor::new(Arc::clone(&store) as Arc<dyn SlideStore>);

    let outcome = editor
        .set_categories(&id("s1"), &labels(&["Blebs"]))
        .await
        .unwrap();
    assert!(!outcome.prompt_colors);
}

#[tokio::test]
async fn notes_and_feature_flag_round_trip() {
    let store = MockStore::with_slides(scenario_slides());
    let editor = SlideEditor::new(Arc::clone(&store) as Arc<dyn SlideStore>);

    let updated = editor
        .set_notes(&id("s1"), Some("spiral motion under 400x"))
        .await
        .unwrap();
    assert_eq!(updated.notes.as_deref(), Some("spiral motion under 400x"));
    assert_eq!(
        store.slide("s1").notes.as_deref(),
        Some("spiral motion under 400x")
    );

    let featured = editor.set_featured(&id("s1"), true).await.unwrap();
    assert!(featured.featured);
    assert!(store.slide("s1").featured);

    let cleared = editor.set_notes(&id("s1"), None).await.unwrap();
    assert_eq!(cleared.notes, None);
    assert_eq!(store.slide("s1").notes, None);
}

#[tokio::test]
async fn editing_missing_slide_reports_not_found() {
    let store = MockStore::with_slides(scenario_slides());
    let editor = SlideEditor::new(store as Arc<dyn SlideStore>);

    let err = editor
        .set_colors(&id("ghost"), &labels(&["Red"]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Service(ref e) if e.is_not_found()));
}

#[tokio::test]
async fn confirmed_edit_refreshes_loaded_copy() {
    let store = MockStore::with_slides(scenario_slides());
    let gallery = gallery_over(store, 2);
    gallery.refresh().await.unwrap();

    gallery
        .set_colors(&id("s5"), &labels(&["Orange"]))
        .await
        .unwrap();

    let records = gallery.records().await;
    assert_eq!(records[0].id.as_str(), "s5");
    assert_eq!(records[0].effective_colors(), labels(&["Orange"]));
}
