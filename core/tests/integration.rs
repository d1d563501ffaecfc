//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port and drives the
//! `Library` facade over real HTTP through a ureq-backed `Transport`, so
//! request building, response parsing and the local rules are checked
//! against the actual routes.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, DurationRound, Utc};
use library_core::auth::{LoginBlock, MemoryStorage};
use library_core::{
    ApiError, Book, Category, ClientConfig, Credentials, HttpMethod, HttpRequest, HttpResponse,
    Library, Loan, LoanInput, LoanStatus, Transport, User,
};
use library_mock_server::{ADMIN_EMAIL, ADMIN_PASSWORD};

/// Executes core requests with ureq.
///
/// ureq's status-as-error behavior is disabled so 4xx/5xx responses come
/// back as data and the core does the status interpretation.
struct UreqTransport {
    agent: ureq::Agent,
    calls: Arc<AtomicUsize>,
}

impl UreqTransport {
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            agent,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send_body(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<String>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

impl Transport for UreqTransport {
    fn execute(&mut self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let agent = &self.agent;
        let headers = &req.headers;
        let result = match req.method {
            HttpMethod::Get => with_headers(agent.get(&req.path), headers).call(),
            HttpMethod::Delete => with_headers(agent.delete(&req.path), headers).call(),
            HttpMethod::Post => send_body(with_headers(agent.post(&req.path), headers), req.body),
            HttpMethod::Put => send_body(with_headers(agent.put(&req.path), headers), req.body),
            HttpMethod::Patch => send_body(with_headers(agent.patch(&req.path), headers), req.body),
        };
        let mut response = result.map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string().unwrap_or_default();
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body,
        })
    }
}

/// Start a fresh mock server and return its base URL.
fn spawn_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            library_mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

/// A clock that moves two seconds forward on every reading, so consecutive
/// login attempts are never refused for spacing.
fn ticking_clock() -> impl Fn() -> DateTime<Utc> + Send + Sync {
    let ticks = Arc::new(AtomicI64::new(0));
    move || Utc::now() + Duration::seconds(ticks.fetch_add(2, Ordering::SeqCst))
}

fn library_with(config: ClientConfig) -> Library<UreqTransport> {
    let config = config.with_base_url(spawn_server());
    Library::new(config, UreqTransport::new(), Box::new(MemoryStorage::new()))
        .with_clock(ticking_clock())
}

fn signed_in(config: ClientConfig) -> Library<UreqTransport> {
    let mut lib = library_with(config);
    lib.login(&Credentials::new(ADMIN_EMAIL, ADMIN_PASSWORD))
        .unwrap();
    lib
}

fn book(isbn: &str, copies: u32) -> Book {
    Book {
        title: "Dom Casmurro".into(),
        author: "Machado de Assis".into(),
        isbn: isbn.into(),
        total: Some(copies),
        ..Book::default()
    }
}

/// Whole seconds, so the date survives the JSON round-trip unchanged.
fn days_from_now(days: i64) -> DateTime<Utc> {
    (Utc::now() + Duration::days(days))
        .duration_trunc(Duration::seconds(1))
        .unwrap()
}

fn admin_id(lib: &mut Library<UreqTransport>) -> String {
    lib.session().user().and_then(|u| u.id.clone()).unwrap()
}

#[test]
fn catalog_crud_lifecycle() {
    let mut lib = signed_in(ClientConfig {
        page_size: 2,
        ..ClientConfig::default()
    });
    assert!(lib.session().is_authenticated());

    let category = lib.create::<Category>(&Category::new("Romance")).unwrap();
    let category_id = category.id.clone().unwrap();

    for isbn in ["1", "2", "3"] {
        let mut b = book(isbn, 1);
        b.category = Some(category_id.as_str().into());
        lib.create::<Book>(&b).unwrap();
    }

    // Three books over pages of two.
    let books = lib.fetch::<Book>(true).unwrap();
    assert_eq!(books.len(), 3);
    assert!(books.iter().all(|b| b.available == Some(1)));

    let in_category = lib.books_by_category(&category_id).unwrap();
    assert_eq!(in_category.len(), 3);
    assert_eq!(lib.search_books("casmurro").unwrap().len(), 3);
    assert!(lib.search_books("iracema").unwrap().is_empty());

    let renamed = lib
        .update::<Category>(&category_id, &Category::new("Romance brasileiro"))
        .unwrap();
    assert_eq!(renamed.name, "Romance brasileiro");

    // Still referenced by books.
    let err = lib.delete::<Category>(&category_id).unwrap_err();
    assert!(matches!(err, ApiError::Rejected { status: 400, .. }));
    assert_eq!(lib.stores().categories.error(), Some(err.to_string().as_str()));

    let first = lib.fetch::<Book>(true).unwrap()[0].id.clone().unwrap();
    lib.delete::<Book>(&first).unwrap();
    assert!(lib.stores().books.find(&first).is_none());
    let err = lib.get::<Book>(&first).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn loan_round_trip_renewal_and_return() {
    let mut lib = signed_in(ClientConfig::default());
    let user_id = admin_id(&mut lib);
    let book_id = lib.create::<Book>(&book("978", 2)).unwrap().id.unwrap();

    let input = LoanInput::new(&user_id, &book_id, days_from_now(7));
    let loan = lib.create_loan(&input).unwrap();
    let loan_id = loan.id.clone().unwrap();
    assert_eq!(loan.status, Some(LoanStatus::Pending));
    assert_eq!(loan.book.id(), Some(book_id.as_str()));
    assert!(loan.book.is_resolved());
    assert!(!lib.stores().books.is_loaded());

    // Fetch, edit the due date, fetch again by id.
    let fetched = lib.get::<Loan>(&loan_id).unwrap();
    let mut edit = LoanInput::from_loan(&fetched).unwrap();
    edit.due_date = days_from_now(14);
    lib.update_loan(&loan_id, &edit).unwrap();
    let refetched = lib.get::<Loan>(&loan_id).unwrap();
    assert_eq!(refetched.due_date, edit.due_date);

    let renewed = lib.renew_loan(&loan_id).unwrap();
    assert_eq!(renewed.renewal_count(), 1);
    assert_eq!(renewed.due_date, edit.due_date + Duration::days(7));
    let renewed = lib.renew_loan(&loan_id).unwrap();
    assert_eq!(renewed.status, Some(LoanStatus::Renewed));
    assert!(!renewed.can_renew(lib.now()));

    // The third renewal never leaves the client.
    let calls = lib.transport_mut().calls.load(Ordering::SeqCst);
    assert!(matches!(lib.renew_loan(&loan_id), Err(ApiError::NotRenewable)));
    assert_eq!(lib.transport_mut().calls.load(Ordering::SeqCst), calls);

    let returned = lib.return_loan(&loan_id).unwrap();
    assert_eq!(returned.status, Some(LoanStatus::Returned));
    assert_eq!(returned.fine, Some(0.0));
    assert!(matches!(lib.return_loan(&loan_id), Err(ApiError::NotReturnable)));

    let book = lib.get::<Book>(&book_id).unwrap();
    assert_eq!(book.available, Some(2));

    assert_eq!(lib.loans_by_book(&book_id).unwrap().len(), 1);
    assert_eq!(lib.loans_by_user(&user_id).unwrap().len(), 1);
    assert!(lib.overdue_loans().unwrap().is_empty());
}

#[test]
fn stale_availability_is_caught_by_the_server() {
    let mut lib = signed_in(ClientConfig::default());
    let user_id = admin_id(&mut lib);
    let book_id = lib.create::<Book>(&book("1", 1)).unwrap().id.unwrap();
    lib.fetch::<Book>(true).unwrap();

    let input = LoanInput::new(&user_id, &book_id, days_from_now(7));
    lib.create_loan(&input).unwrap();

    // The cached book still shows a free copy; the server refuses.
    assert_eq!(lib.stores().books.find(&book_id).unwrap().available, Some(1));
    let err = lib.create_loan(&input).unwrap_err();
    assert!(matches!(err, ApiError::Rejected { status: 400, .. }));

    // A refetch brings the counter up to date and the local gate applies.
    lib.fetch::<Book>(false).unwrap();
    assert_eq!(lib.stores().books.find(&book_id).unwrap().available, Some(0));
    assert!(matches!(lib.create_loan(&input), Err(ApiError::BookUnavailable)));
}

#[test]
fn patched_availability_gates_locally() {
    let mut lib = signed_in(ClientConfig {
        patch_availability: true,
        ..ClientConfig::default()
    });
    let user_id = admin_id(&mut lib);
    let book_id = lib.create::<Book>(&book("1", 1)).unwrap().id.unwrap();
    lib.fetch::<Book>(true).unwrap();

    let input = LoanInput::new(&user_id, &book_id, days_from_now(7));
    let loan_id = lib.create_loan(&input).unwrap().id.unwrap();
    assert_eq!(lib.stores().books.find(&book_id).unwrap().available, Some(0));
    assert!(matches!(lib.create_loan(&input), Err(ApiError::BookUnavailable)));

    lib.delete_loan(&loan_id).unwrap();
    assert_eq!(lib.stores().books.find(&book_id).unwrap().available, Some(1));
    let book = lib.get::<Book>(&book_id).unwrap();
    assert_eq!(book.available, Some(1));
}

#[test]
fn lockout_after_five_failed_logins() {
    let mut lib = library_with(ClientConfig::default());
    let wrong = Credentials::new(ADMIN_EMAIL, "wrong-password");
    for _ in 0..5 {
        assert!(matches!(lib.login(&wrong), Err(ApiError::Unauthorized(_))));
    }
    let calls = lib.transport_mut().calls.load(Ordering::SeqCst);
    assert_eq!(calls, 5);

    let right = Credentials::new(ADMIN_EMAIL, ADMIN_PASSWORD);
    let err = lib.login(&right).unwrap_err();
    assert!(matches!(err, ApiError::LoginBlocked(LoginBlock::Locked { .. })));
    assert_eq!(lib.transport_mut().calls.load(Ordering::SeqCst), calls);
    assert!(!lib.session().is_authenticated());
}

#[test]
fn rejected_token_ends_the_session() {
    let base_url = spawn_server();
    let storage = MemoryStorage::new().with("token", "stale-token");
    let mut lib = Library::new(
        ClientConfig::default().with_base_url(base_url),
        UreqTransport::new(),
        Box::new(storage),
    );
    assert!(lib.session().is_authenticated());

    let err = lib.fetch::<Book>(false).unwrap_err();
    assert!(err.is_unauthorized());
    assert!(!lib.session().is_authenticated());
    assert!(lib.session().error().is_some());
}

#[test]
fn register_then_check_auth() {
    let mut lib = library_with(ClientConfig::default());
    let user = User {
        name: "Ana Souza".into(),
        email: "ana@example.com".into(),
        password: Some("Leitura@2024".into()),
        ..User::default()
    };
    let err = lib.register(&user, "Leitura@2025").unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    let created = lib.register(&user, "Leitura@2024").unwrap();
    assert!(created.password.is_none());
    assert!(!lib.session().is_authenticated());

    lib.login(&Credentials::new("ana@example.com", "Leitura@2024"))
        .unwrap();
    lib.check_auth().unwrap();
    assert_eq!(lib.session().user().unwrap().name, "Ana Souza");
    assert!(!lib.session().is_checking());
}

#[test]
fn dashboard_summarizes_the_library() {
    let mut lib = signed_in(ClientConfig::default());
    let user_id = admin_id(&mut lib);
    lib.create::<Category>(&Category::new("Poesia")).unwrap();
    let a = lib.create::<Book>(&book("1", 3)).unwrap().id.unwrap();
    let b = lib.create::<Book>(&book("2", 1)).unwrap().id.unwrap();
    lib.create_loan(&LoanInput::new(&user_id, &a, days_from_now(7)))
        .unwrap();
    let late = lib
        .create_loan(&LoanInput {
            loan_date: Some(days_from_now(-10)),
            ..LoanInput::new(&user_id, &b, days_from_now(-3))
        })
        .unwrap();
    assert_eq!(late.status, Some(LoanStatus::Overdue));

    let stats = lib.dashboard().unwrap();
    assert_eq!(stats.total_titles, 2);
    assert_eq!(stats.available_copies, 2);
    assert_eq!(stats.active_loans, 1);
    assert_eq!(stats.overdue_loans, 1);
    assert_eq!(stats.active_users, 1);
    assert_eq!(stats.categories, 1);
    assert_eq!(stats.recent_loans.len(), 2);
    assert_eq!(stats.recent_loans[0].id, lib.stores().loans.items()[0].id);
}
