//! Application facade: client, transport, session and stores wired together.
//!
//! # Design
//! `Library` is what a front-end holds. Each operation runs local checks,
//! builds a request, hands it to the `Transport`, parses the answer and
//! folds the result into the matching `Collection`. Nothing is mutated
//! optimistically: a failed request leaves the previous data in place and
//! only records the error. A 401 on any authenticated request ends the
//! session and clears every collection.
//!
//! Time comes from an injectable clock so loan gates and login throttling
//! can be driven deterministically.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::auth::{check_permission, Permission, Role, Session, Storage};
use crate::client::LibraryClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::lifecycle::{check_loan_availability, FormMode, LoanEvent};
use crate::pagination::Pager;
use crate::stats::DashboardStats;
use crate::store::{Stored, Stores};
use crate::types::{Book, Category, Credentials, Loan, LoanInput, PasswordChange, User};
use crate::validation::{self, check_registration, FieldErrors};

pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct Library<T> {
    client: LibraryClient,
    transport: T,
    session: Session,
    stores: Stores,
    config: ClientConfig,
    clock: Clock,
}

impl<T: Transport> Library<T> {
    /// Restore the persisted session from `storage` and resume with its
    /// token, if any.
    pub fn new(config: ClientConfig, transport: T, storage: Box<dyn Storage>) -> Self {
        let session = Session::restore(storage);
        let mut client = LibraryClient::from_config(&config);
        client.set_token(session.token().map(str::to_string));
        Self {
            client,
            transport,
            session,
            stores: Stores::new(),
            config,
            clock: Box::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn client(&self) -> &LibraryClient {
        &self.client
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Whether the signed-in user holds `permission`. Signed-out sessions
    /// hold none.
    pub fn can(&self, permission: Permission) -> bool {
        check_permission(self.session.user(), permission)
    }

    // -----------------------------------------------------------------------
    // Authentication
    // -----------------------------------------------------------------------

    /// Local checks and throttling come first; a refused attempt never
    /// reaches the server. Only an answered, rejected attempt counts as a
    /// failure.
    pub fn login(&mut self, credentials: &Credentials) -> Result<Option<User>, ApiError> {
        let mut missing = FieldErrors::new();
        if credentials.email.trim().is_empty() {
            missing.add("email", "Email is required");
        }
        if credentials.password.is_empty() {
            missing.add("password", "Password is required");
        }
        missing.into_result().map_err(ApiError::Validation)?;

        let now = self.now();
        if let Err(block) = self.session.update_throttle(|t| t.check(now)) {
            warn!(%block, "login attempt refused locally");
            let err = ApiError::LoginBlocked(block);
            self.session.set_error(Some(err.to_string()));
            return Err(err);
        }

        let result = self
            .client
            .build_login(credentials)
            .and_then(|request| self.send(request))
            .and_then(|response| self.client.parse_login(response));

        match result {
            Ok(login) => {
                self.session.update_throttle(|t| t.record_success());
                self.client.set_token(Some(login.token.clone()));
                self.session.login(login.token, login.user.clone());
                Ok(login.user)
            }
            Err(e) => {
                if matches!(e.status(), Some(400..=499)) {
                    let now = self.now();
                    self.session.update_throttle(|t| t.record_failure(now));
                    warn!(
                        attempts = self.session.throttle().failed_attempts(),
                        "login rejected"
                    );
                }
                self.session.set_error(Some(e.to_string()));
                Err(e)
            }
        }
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.client.set_token(None);
        self.stores.reset_all();
    }

    /// Self-registration. Does not sign the new account in.
    pub fn register(&mut self, user: &User, password_confirmation: &str) -> Result<User, ApiError> {
        check_registration(user, password_confirmation).map_err(ApiError::Validation)?;
        let result = self
            .client
            .build_register(user)
            .and_then(|request| self.send(request))
            .and_then(|response| self.client.parse_register(response));
        if let Err(e) = &result {
            self.session.set_error(Some(e.to_string()));
        }
        result
    }

    /// Confirm the stored token is still accepted and refresh the cached
    /// user. A rejected token ends the session.
    pub fn check_auth(&mut self) -> Result<(), ApiError> {
        self.session.begin_auth_check()?;
        let (kind, request) = self.client.build_auth_check(self.session.user());
        let result = self
            .send(request)
            .and_then(|response| self.client.parse_auth_check(&kind, response));
        match result {
            Ok(user) => {
                self.session.finish_auth_check(Ok(user));
                Ok(())
            }
            Err(e) => {
                self.session.finish_auth_check(Err(&e));
                self.client.set_token(None);
                self.stores.reset_all();
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Generic CRUD
    // -----------------------------------------------------------------------

    /// The whole collection, walked page by page. A loaded collection is
    /// served from memory unless `force` is set.
    pub fn fetch<R: Stored>(&mut self, force: bool) -> Result<&[R], ApiError> {
        if !force && self.stores.of::<R>().is_loaded() {
            debug!(resource = R::LABEL, "serving cached collection");
            return Ok(self.stores.of::<R>().items());
        }
        self.track::<R, _>(|lib| {
            let mut pager = Pager::<R>::new(lib.config.page_size, lib.config.max_pages);
            while let Some(request) = pager.next_request(&lib.client) {
                let response = lib.send(request)?;
                pager.feed(&lib.client, response)?;
            }
            lib.stores.of_mut::<R>().set_all(pager.into_items());
            Ok(())
        })?;
        Ok(self.stores.of::<R>().items())
    }

    pub fn get<R: Stored>(&mut self, id: &str) -> Result<R, ApiError> {
        self.track::<R, _>(|lib| {
            let response = lib.send(lib.client.build_get::<R>(id))?;
            let record = lib.client.parse_one::<R>(response)?;
            lib.stores.of_mut::<R>().set_current(record.clone());
            Ok(record)
        })
    }

    pub fn create<R: Stored>(&mut self, input: &R::Input) -> Result<R, ApiError> {
        validation::validate(input).map_err(ApiError::Validation)?;
        self.track::<R, _>(|lib| {
            let response = lib.send(lib.client.build_create::<R>(input)?)?;
            let record = lib.client.parse_one::<R>(response)?;
            info!(resource = R::LABEL, id = record.id(), "created");
            lib.stores.of_mut::<R>().insert(record.clone());
            Ok(record)
        })
    }

    pub fn update<R: Stored>(&mut self, id: &str, input: &R::Input) -> Result<R, ApiError> {
        validation::validate(input).map_err(ApiError::Validation)?;
        self.track::<R, _>(|lib| {
            let response = lib.send(lib.client.build_update::<R>(id, input)?)?;
            let record = lib.client.parse_one::<R>(response)?;
            lib.stores.of_mut::<R>().replace(record.clone());
            Ok(record)
        })
    }

    /// Loans go through `delete_loan` so the book's counter is accounted for.
    pub fn delete<R: Stored>(&mut self, id: &str) -> Result<(), ApiError> {
        self.track::<R, _>(|lib| {
            let response = lib.send(lib.client.build_delete::<R>(id))?;
            lib.client.parse_delete::<R>(response)?;
            info!(resource = R::LABEL, id, "deleted");
            lib.stores.of_mut::<R>().remove(id);
            Ok(())
        })
    }

    // -----------------------------------------------------------------------
    // Books and users
    // -----------------------------------------------------------------------

    pub fn search_books(&mut self, term: &str) -> Result<&[Book], ApiError> {
        if term.trim().is_empty() {
            return self.fetch::<Book>(false);
        }
        let request = self.client.build_search_books(term);
        self.fetch_filtered::<Book>(request)
    }

    pub fn books_by_category(&mut self, category_id: &str) -> Result<&[Book], ApiError> {
        let request = self.client.build_books_by_category(category_id);
        self.fetch_filtered::<Book>(request)
    }

    /// Activate or deactivate an account. Accounts are deactivated rather
    /// than deleted.
    pub fn set_user_status(&mut self, user_id: &str, active: bool) -> Result<User, ApiError> {
        let request = self.client.build_set_user_status(user_id, active)?;
        self.user_action(request)
    }

    pub fn set_user_role(&mut self, user_id: &str, role: &Role) -> Result<User, ApiError> {
        let request = self.client.build_set_user_role(user_id, role)?;
        self.user_action(request)
    }

    pub fn change_password(&mut self, user_id: &str, change: &PasswordChange) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if change.current.is_empty() {
            errors.add("current", "Current password is required");
        }
        if let Some(problem) = validation::password_problem(&change.new) {
            errors.add("new", problem);
        }
        errors.into_result().map_err(ApiError::Validation)?;

        self.track::<User, _>(|lib| {
            let response = lib.send(lib.client.build_change_password(user_id, change)?)?;
            lib.client.parse_change_password(response)?;
            lib.stores.users.finish();
            Ok(())
        })
    }

    // -----------------------------------------------------------------------
    // Loans
    // -----------------------------------------------------------------------

    /// New loans need a free copy of the book. The book is taken from the
    /// cache when present, fetched otherwise.
    pub fn create_loan(&mut self, input: &LoanInput) -> Result<Loan, ApiError> {
        validation::validate(input).map_err(ApiError::Validation)?;
        let book = match self.stores.books.find(&input.book_id) {
            Some(book) => book.clone(),
            None => {
                let response = self.send(self.client.build_get::<Book>(&input.book_id))?;
                self.settle(self.client.parse_one::<Book>(response))?
            }
        };
        if let Err(e) = check_loan_availability(&book, FormMode::Create) {
            warn!(book = %input.book_id, "loan refused: no copies available");
            return Err(e);
        }

        let loan = self.create::<Loan>(input)?;
        self.apply_loan_event(Some(&input.book_id), LoanEvent::Created);
        Ok(loan)
    }

    /// Editing a loan consumes no copy, so availability is not checked.
    /// Moving an open loan to another book moves a copy between the two.
    pub fn update_loan(&mut self, loan_id: &str, input: &LoanInput) -> Result<Loan, ApiError> {
        let now = self.now();
        let previous = self
            .cached_loan(loan_id)
            .map(|loan| (loan.book.id().map(str::to_string), loan.can_finalize(now)));
        let loan = self.update::<Loan>(loan_id, input)?;
        match previous {
            Some((Some(old_book), was_open)) => {
                if was_open && old_book != input.book_id {
                    self.apply_loan_event(Some(&old_book), LoanEvent::Returned);
                    self.apply_loan_event(Some(&input.book_id), LoanEvent::Created);
                }
            }
            Some((None, _)) | None => self.stores.books.mark_stale(),
        }
        Ok(loan)
    }

    pub fn return_loan(&mut self, loan_id: &str) -> Result<Loan, ApiError> {
        let now = self.now();
        if self.cached_loan(loan_id).is_some_and(|l| !l.can_finalize(now)) {
            return Err(ApiError::NotReturnable);
        }
        let request = self.client.build_return_loan(loan_id);
        let loan = self.loan_action(request)?;
        self.apply_loan_event(loan.book.id(), LoanEvent::Returned);
        Ok(loan)
    }

    /// The server picks the new due date; the returned record replaces the
    /// cached one as is.
    pub fn renew_loan(&mut self, loan_id: &str) -> Result<Loan, ApiError> {
        let now = self.now();
        if self.cached_loan(loan_id).is_some_and(|l| !l.can_renew(now)) {
            return Err(ApiError::NotRenewable);
        }
        let request = self.client.build_renew_loan(loan_id);
        self.loan_action(request)
    }

    pub fn pay_fine(&mut self, loan_id: &str) -> Result<Loan, ApiError> {
        let request = self.client.build_pay_fine(loan_id);
        self.loan_action(request)
    }

    pub fn delete_loan(&mut self, loan_id: &str) -> Result<(), ApiError> {
        let now = self.now();
        let (book_id, was_open) = match self.cached_loan(loan_id) {
            Some(loan) => (loan.book.id().map(str::to_string), loan.can_finalize(now)),
            None => (None, true),
        };
        self.delete::<Loan>(loan_id)?;
        self.apply_loan_event(book_id.as_deref(), LoanEvent::Deleted { was_open });
        Ok(())
    }

    pub fn overdue_loans(&mut self) -> Result<&[Loan], ApiError> {
        let request = self.client.build_overdue_loans();
        self.fetch_filtered::<Loan>(request)
    }

    pub fn loans_by_user(&mut self, user_id: &str) -> Result<&[Loan], ApiError> {
        let request = self.client.build_loans_by_user(user_id);
        self.fetch_filtered::<Loan>(request)
    }

    pub fn loans_by_book(&mut self, book_id: &str) -> Result<&[Loan], ApiError> {
        let request = self.client.build_loans_by_book(book_id);
        self.fetch_filtered::<Loan>(request)
    }

    // -----------------------------------------------------------------------
    // Dashboard
    // -----------------------------------------------------------------------

    /// Load whatever is not cached yet, then summarize.
    pub fn dashboard(&mut self) -> Result<DashboardStats, ApiError> {
        self.fetch::<Book>(false)?;
        self.fetch::<Category>(false)?;
        self.fetch::<User>(false)?;
        self.fetch::<Loan>(false)?;
        Ok(DashboardStats::compute(&self.stores))
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    fn send(&mut self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, path = %request.path, "dispatching request");
        self.transport.execute(request).inspect_err(|e| {
            error!(error = %e, "request failed without a response");
        })
    }

    /// A 401 anywhere ends the session.
    fn settle<V>(&mut self, result: Result<V, ApiError>) -> Result<V, ApiError> {
        if let Err(e) = &result {
            if e.is_unauthorized() && self.session.is_authenticated() {
                warn!("token rejected; signing out");
                self.logout();
                self.session.set_error(Some(e.to_string()));
            }
        }
        result
    }

    /// Run `op` as one request cycle of the `R` collection: flag it loading,
    /// and record the error if `op` fails.
    fn track<R: Stored, V>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<V, ApiError>,
    ) -> Result<V, ApiError> {
        self.stores.of_mut::<R>().begin();
        let result = op(self);
        let result = self.settle(result);
        if let Err(e) = &result {
            self.stores.of_mut::<R>().fail(e.to_string());
        }
        result
    }

    fn fetch_filtered<R: Stored>(&mut self, request: HttpRequest) -> Result<&[R], ApiError> {
        self.track::<R, _>(|lib| {
            let response = lib.send(request)?;
            let items = lib.client.parse_list::<R>(response)?;
            lib.stores.of_mut::<R>().set_filtered(items);
            Ok(())
        })?;
        Ok(self.stores.of::<R>().items())
    }

    fn user_action(&mut self, request: HttpRequest) -> Result<User, ApiError> {
        let user = self.track::<User, _>(|lib| {
            let response = lib.send(request)?;
            let user = lib.client.parse_one::<User>(response)?;
            lib.stores.users.replace(user.clone());
            Ok(user)
        })?;
        if user.id.is_some() && self.session.user().and_then(|u| u.id.as_deref()) == user.id.as_deref() {
            self.session.set_user(Some(user.clone()));
        }
        Ok(user)
    }

    fn loan_action(&mut self, request: HttpRequest) -> Result<Loan, ApiError> {
        self.track::<Loan, _>(|lib| {
            let response = lib.send(request)?;
            let loan = lib.client.parse_one::<Loan>(response)?;
            lib.stores.loans.replace(loan.clone());
            Ok(loan)
        })
    }

    fn cached_loan(&self, loan_id: &str) -> Option<&Loan> {
        let loans = &self.stores.loans;
        loans
            .current()
            .filter(|l| l.id.as_deref() == Some(loan_id))
            .or_else(|| loans.find(loan_id))
    }

    /// Book counters move server-side. The cached book list is marked stale
    /// so the next fetch picks the change up; with `patch_availability` the
    /// cached record is adjusted right away as well.
    fn apply_loan_event(&mut self, book_id: Option<&str>, event: LoanEvent) {
        if event.availability_delta() == 0 {
            return;
        }
        self.stores.books.mark_stale();
        if !self.config.patch_availability {
            return;
        }
        let Some(book_id) = book_id else {
            return;
        };
        if let Some(book) = self.stores.books.find_mut(book_id) {
            book.apply_loan_event(event);
            debug!(book = book_id, available = book.available, "patched cached availability");
        }
    }
}
