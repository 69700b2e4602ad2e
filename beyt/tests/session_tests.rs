//! Result aggregation and pagination against a scripted backend

use async_trait::async_trait;
use beyt::models::{
    parse_search_response, ContextVerse, PoemRecord, PoetRecord, SearchPage, VerseRecord,
};
use beyt::{BeytError, LoadOutcome, SearchBackend, SearchRequest, SearchSession, PAGE_SIZE};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

enum Reply {
    Page(SearchPage),
    Fail(BeytError),
    /// Never answers; only cancellation ends the call
    Hang,
}

type Responder = dyn Fn(&SearchRequest, usize) -> Reply + Send + Sync;

struct ScriptedBackend {
    calls: AtomicUsize,
    requests: Mutex<Vec<SearchRequest>>,
    responder: Box<Responder>,
    poets: Vec<String>,
}

impl ScriptedBackend {
    fn new(responder: impl Fn(&SearchRequest, usize) -> Reply + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            responder: Box::new(responder),
            poets: vec!["حافظ".into(), "سعدی".into(), "مولوی".into()],
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn requested_pages(&self) -> Vec<u32> {
        self.requests.lock().iter().map(|r| r.page).collect()
    }
}

#[async_trait]
impl SearchBackend for ScriptedBackend {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage, BeytError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        match (self.responder)(request, n) {
            Reply::Page(page) => Ok(page),
            Reply::Fail(err) => Err(err),
            Reply::Hang => std::future::pending().await,
        }
    }

    async fn poets(&self) -> Result<Vec<String>, BeytError> {
        Ok(self.poets.clone())
    }

    async fn poet(&self, poet_id: u64) -> Result<PoetRecord, BeytError> {
        let name = usize::try_from(poet_id)
            .ok()
            .and_then(|id| self.poets.get(id.checked_sub(1)?))
            .cloned()
            .unwrap_or_default();
        Ok(PoetRecord {
            id: Some(poet_id as i64),
            raw: format!(r#"{{"id":{poet_id},"name":"{name}"}}"#),
            name,
            ..Default::default()
        })
    }

    async fn poem(&self, poem_id: i64) -> Result<PoemRecord, BeytError> {
        Ok(PoemRecord {
            id: Some(poem_id),
            title: "غزل".into(),
            text: "a    b\nc    d".into(),
            ..Default::default()
        })
    }
}

fn record(verse_id: i64, poet: &str) -> VerseRecord {
    VerseRecord {
        id: Some(verse_id),
        poem_id: Some(verse_id / 10),
        poet: poet.into(),
        poem_title: format!("poem {verse_id}"),
        text: format!("verse {verse_id}"),
        context_verses: vec![ContextVerse {
            id: Some(verse_id),
            text: format!("verse {verse_id}"),
            vorder: 1,
            position: Some(-1),
            is_match: true,
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// `count` records whose ids are unique per backend page
fn page_of(request: &SearchRequest, count: i64, total: Option<u64>) -> Reply {
    let base = i64::from(request.page) * 1000;
    let records = (0..count).map(|i| record(base + i, "حافظ")).collect();
    Reply::Page(SearchPage::new(records, total))
}

fn session(backend: &Arc<ScriptedBackend>) -> SearchSession {
    SearchSession::with_backend(backend.clone())
}

#[tokio::test]
async fn test_start_search_loads_first_page() {
    let backend = ScriptedBackend::new(|req, _| page_of(req, 3, Some(120)));
    let session = session(&backend);

    let snapshot = session
        .start_search("عشق".into(), vec!["حافظ".into()], true)
        .await
        .unwrap();

    assert_eq!(snapshot.loaded_count, 3);
    assert_eq!(snapshot.total_count, 120);
    assert_eq!(snapshot.backend_page, 1);
    assert!(!snapshot.is_fetching_more);
    assert!(session.can_load_more());

    let request = backend.requests.lock()[0].clone();
    assert_eq!(request.page, 1);
    assert_eq!(request.limit, PAGE_SIZE);
    assert_eq!(request.offset(), 0);
    assert_eq!(request.poet_names, vec!["حافظ".to_string()]);
    assert!(request.liked_only);
}

#[tokio::test]
async fn test_total_falls_back_to_loaded_count() {
    let backend = ScriptedBackend::new(|req, _| page_of(req, 2, None));
    let session = session(&backend);

    let snapshot = session.start_search("می".into(), vec![], false).await.unwrap();
    assert_eq!(snapshot.total_count, 2);
    assert!(!session.can_load_more());

    assert_eq!(session.load_more().await.unwrap(), LoadOutcome::Exhausted);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_rapid_load_more_makes_one_request() {
    let backend = ScriptedBackend::new(|req, _| page_of(req, 2, Some(100)));
    let session = session(&backend);
    session.start_search("گل".into(), vec![], false).await.unwrap();

    let (a, b) = tokio::join!(session.load_more(), session.load_more());
    let mut outcomes = vec![a.unwrap(), b.unwrap()];
    outcomes.sort_by_key(|o| matches!(o, LoadOutcome::AlreadyLoading));
    assert_eq!(outcomes, vec![LoadOutcome::Appended { count: 2 }, LoadOutcome::AlreadyLoading]);

    assert_eq!(backend.calls(), 2);
    let excerpts = session.excerpts();
    assert_eq!(excerpts.len(), 4);
    let ids: HashSet<_> = excerpts.iter().map(|e| e.verse_id).collect();
    assert_eq!(ids.len(), 4);
    assert_eq!(session.snapshot().backend_page, 2);
    assert!(!session.snapshot().is_fetching_more);
}

#[tokio::test]
async fn test_start_search_replaces_appended_results() {
    let backend = ScriptedBackend::new(|req, _| {
        let count = if req.query == "first" { 3 } else { 1 };
        page_of(req, count, Some(100))
    });
    let session = session(&backend);

    session.start_search("first".into(), vec![], false).await.unwrap();
    session.load_more().await.unwrap();
    assert!(session.advance());
    assert_eq!(session.excerpts().len(), 6);

    let snapshot = session
        .start_search("second".into(), vec!["سعدی".into()], false)
        .await
        .unwrap();
    assert_eq!(snapshot.loaded_count, 1);
    assert_eq!(snapshot.backend_page, 1);
    assert_eq!(snapshot.cursor, 0);
    assert_eq!(snapshot.query, "second");
    assert_eq!(snapshot.poet_names, vec!["سعدی".to_string()]);
    assert_eq!(session.excerpts()[0].verse_id, Some(1000));
}

#[tokio::test]
async fn test_failed_first_page_leaves_session_empty() {
    let backend = ScriptedBackend::new(|req, n| {
        if n == 0 {
            page_of(req, 5, Some(5))
        } else {
            Reply::Fail(BeytError::Http { status: 500, message: "boom".into() })
        }
    });
    let session = session(&backend);
    session.start_search("one".into(), vec![], false).await.unwrap();

    let err = session.start_search("two".into(), vec![], false).await.unwrap_err();
    assert_eq!(err.status(), Some(500));

    let snapshot = session.snapshot();
    assert_eq!(snapshot.loaded_count, 0);
    assert_eq!(snapshot.total_count, 0);
    assert_eq!(snapshot.backend_page, 0);
    assert!(!snapshot.is_fetching_more);
    assert!(session.current().is_none());
}

#[tokio::test]
async fn test_failed_load_more_keeps_results_and_retries_same_page() {
    let backend = ScriptedBackend::new(|req, n| {
        if n == 1 {
            Reply::Fail(BeytError::Network("connection reset".into()))
        } else {
            page_of(req, 2, Some(10))
        }
    });
    let session = session(&backend);
    session.start_search("باده".into(), vec![], false).await.unwrap();

    let err = session.load_more().await.unwrap_err();
    assert!(matches!(err, BeytError::Network(_)));
    let snapshot = session.snapshot();
    assert_eq!(snapshot.loaded_count, 2);
    assert_eq!(snapshot.backend_page, 1);
    assert!(!snapshot.is_fetching_more);

    assert_eq!(session.load_more().await.unwrap(), LoadOutcome::Appended { count: 2 });
    assert_eq!(backend.requested_pages(), vec![1, 2, 2]);
    assert_eq!(session.snapshot().backend_page, 2);
}

#[tokio::test]
async fn test_stale_search_is_superseded() {
    let backend = ScriptedBackend::new(|req, _| {
        if req.query == "slow" {
            Reply::Hang
        } else {
            page_of(req, 2, Some(2))
        }
    });
    let session = session(&backend);

    let (stale, fresh) = tokio::join!(session.start_search("slow".into(), vec![], false), async {
        tokio::task::yield_now().await;
        session.start_search("fast".into(), vec![], false).await
    });

    assert!(matches!(stale, Err(BeytError::Superseded)));
    let fresh = fresh.unwrap();
    assert_eq!(fresh.query, "fast");
    assert_eq!(fresh.loaded_count, 2);
    assert_eq!(session.snapshot().query, "fast");
}

#[tokio::test]
async fn test_stale_load_more_is_superseded() {
    let backend = ScriptedBackend::new(|req, _| {
        if req.query == "old" && req.page == 2 {
            Reply::Hang
        } else {
            page_of(req, 1, Some(50))
        }
    });
    let session = session(&backend);
    session.start_search("old".into(), vec![], false).await.unwrap();

    let (stale, fresh) = tokio::join!(session.load_more(), async {
        tokio::task::yield_now().await;
        session.start_search("new".into(), vec![], false).await
    });

    assert!(matches!(stale, Err(BeytError::Superseded)));
    assert_eq!(fresh.unwrap().loaded_count, 1);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.query, "new");
    assert_eq!(snapshot.loaded_count, 1);
    assert_eq!(snapshot.backend_page, 1);
    assert!(!snapshot.is_fetching_more);
}

#[tokio::test]
async fn test_load_more_requires_a_search() {
    let backend = ScriptedBackend::new(|req, _| page_of(req, 1, None));
    let session = session(&backend);
    assert!(matches!(session.load_more().await, Err(BeytError::InvalidInput(_))));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_cursor_stays_within_loaded_excerpts() {
    let backend = ScriptedBackend::new(|req, _| page_of(req, 3, Some(300)));
    let session = session(&backend);
    assert!(!session.advance());
    assert!(session.current().is_none());

    session.start_search("شب".into(), vec![], false).await.unwrap();
    assert!(!session.retreat());
    assert!(session.advance());
    assert!(session.advance());
    // More exist server-side, but advancing never fetches
    assert!(session.can_load_more());
    assert!(!session.advance());
    assert_eq!(session.current().unwrap().verse_id, Some(1002));
    assert_eq!(session.snapshot().cursor, 2);
    assert!(session.retreat());
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_poet_ids_follow_loaded_directory() {
    let backend = ScriptedBackend::new(|_, _| {
        let records = vec![record(1, "سعدی"), record(2, "فردوسی")];
        Reply::Page(SearchPage::new(records, None))
    });
    let session = session(&backend);

    session.start_search("a".into(), vec![], false).await.unwrap();
    assert_eq!(session.excerpts()[0].poet_id, None);

    let poets = session.load_poets().await.unwrap();
    assert_eq!(poets.len(), 3);
    assert_eq!(session.poet_names_for(vec![2]), vec!["سعدی".to_string()]);

    session.start_search("a".into(), vec![], false).await.unwrap();
    let excerpts = session.excerpts();
    assert_eq!(excerpts[0].poet_id, Some(2));
    assert_eq!(excerpts[1].poet_id, None);
}

#[tokio::test]
async fn test_fetch_poem_renders_every_line() {
    let backend = ScriptedBackend::new(|req, _| page_of(req, 1, None));
    let session = session(&backend);

    let poem = session.fetch_poem(77).await.unwrap();
    assert_eq!(poem.poem_id, Some(77));
    assert_eq!(poem.lines.len(), 2);
    assert_eq!(poem.lines[1].texts(), vec!["c", "d"]);
}

#[tokio::test]
async fn test_camel_case_total_keeps_pagination_open() {
    let backend = ScriptedBackend::new(|_, _| {
        let body = r#"{"verses": [{"id": 1, "poet": "حافظ"}], "totalResults": 120}"#;
        Reply::Page(parse_search_response(body).unwrap())
    });
    let session = session(&backend);

    let snapshot = session.start_search("دل".into(), vec![], false).await.unwrap();
    assert_eq!(snapshot.total_count, 120);
    assert!(session.can_load_more());
    assert_eq!(session.load_more().await.unwrap(), LoadOutcome::Appended { count: 1 });
    assert_eq!(backend.requested_pages(), vec![1, 2]);
}

#[tokio::test]
async fn test_fetch_poet_passes_details_through() {
    let backend = ScriptedBackend::new(|req, _| page_of(req, 1, None));
    let session = session(&backend);

    let poet = session.fetch_poet(3).await.unwrap();
    assert_eq!(poet.poet_id, 3);
    assert_eq!(poet.name, "مولوی");
    assert_eq!(poet.details_json, r#"{"id":3,"name":"مولوی"}"#);
}
