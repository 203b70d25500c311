//! Application state and the main event loop.

pub mod event;

pub use event::AppEvent;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use shared::types::{ActivityError, AppConfig, LoginError, RegistrationError};

use crate::api::{ApiClient, ApiError, QrKind};
use crate::camera::{KeyboardFeed, build_backend};
use crate::routes::{Route, home, resolve};
use crate::scan::{ModalAction, ScanDriver, SharedMachine, lock, shared_machine};
use crate::screens::Action;
use crate::screens::activities::ActivitiesScreen;
use crate::screens::activity_form::RegisterActivityScreen;
use crate::screens::activity_table::ActivityTableScreen;
use crate::screens::home::{Menu, ParticipantHome};
use crate::screens::login::LoginScreen;
use crate::screens::my_activities::{LOAD_ERROR_MESSAGE, MyActivitiesScreen};
use crate::screens::qr_reader::QrReaderScreen;
use crate::screens::register::{REGISTERED_MESSAGE, RegisterScreen};
use crate::session::{Session, SessionStore};
use crate::ui;

pub const SESSION_EXPIRED_MESSAGE: &str = "Sessão expirada. Faça login novamente.";

const TICK: Duration = Duration::from_millis(250);

pub struct App {
    pub(crate) api: ApiClient,
    pub(crate) store: SessionStore,
    pub(crate) session: Option<Session>,
    pub(crate) route: Route,
    pub(crate) download_dir: PathBuf,

    pub(crate) driver: ScanDriver,
    pub(crate) scan: SharedMachine,
    pub(crate) keyboard: Option<KeyboardFeed>,

    pub(crate) login: LoginScreen,
    pub(crate) register: RegisterScreen,
    pub(crate) participant: ParticipantHome,
    pub(crate) admin: Menu,
    pub(crate) activities: ActivitiesScreen,
    pub(crate) activity_table: ActivityTableScreen,
    pub(crate) activity_form: RegisterActivityScreen,
    pub(crate) my_activities: MyActivitiesScreen,
    pub(crate) qr_reader: QrReaderScreen,

    events: mpsc::UnboundedSender<AppEvent>,
    should_quit: bool,
}

impl App {
    pub fn new(config: &AppConfig, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        let api = ApiClient::new(&config.api.resolved_base_url());
        let backend = build_backend(&config.camera);
        let driver = ScanDriver::new(backend.media, backend.decoder, Arc::new(api.clone()));
        let keyboard_mode = backend.keyboard.is_some();

        info!("Service at {}", api.base_url());

        Self {
            api,
            store: SessionStore::new(&config.session.file),
            session: None,
            route: Route::Login,
            download_dir: PathBuf::from(&config.paths.download_dir),
            driver,
            scan: shared_machine(),
            keyboard: backend.keyboard,
            login: LoginScreen::new(),
            register: RegisterScreen::new(),
            participant: ParticipantHome::new(),
            admin: Menu::admin(),
            activities: ActivitiesScreen::default(),
            activity_table: ActivityTableScreen::default(),
            activity_form: RegisterActivityScreen::new(),
            my_activities: MyActivitiesScreen::default(),
            qr_reader: QrReaderScreen::new(keyboard_mode),
            events,
            should_quit: false,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Pick up a session left by a previous run and land on its home route.
    pub fn restore_session(&mut self) {
        match self.store.load() {
            Ok(session) => self.session = session,
            Err(e) => {
                warn!("Discarding stored session: {}", e);
                if let Err(e) = self.store.clear() {
                    warn!("Failed to clear session file: {}", e);
                }
            }
        }
        let role = self.session.as_ref().map(Session::role);
        self.navigate(home(role));
    }

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------

    pub async fn run(
        mut self,
        terminal: &mut DefaultTerminal,
        mut events: mpsc::UnboundedReceiver<AppEvent>,
    ) -> anyhow::Result<()> {
        spawn_input_reader(self.events.clone());
        let mut tick = tokio::time::interval(TICK);

        while !self.should_quit {
            terminal.draw(|frame| ui::draw(frame, &self))?;

            tokio::select! {
                Some(event) = events.recv() => self.handle_event(event),
                _ = tick.tick() => {}
            }
        }

        lock(&self.scan).teardown();
        info!("Bye");
        Ok(())
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Resize | AppEvent::CameraProbed | AppEvent::ScanSettled => {}

            AppEvent::LoginFinished(result) => self.on_login(result),
            AppEvent::RegisterFinished(result) => {
                let result = result.map_err(|e| {
                    warn!("Registration failed: {}", e);
                    if e.is_unauthorized() {
                        RegistrationError::InvalidCredentials
                    } else {
                        RegistrationError::ConnectionError
                    }
                });
                let ok = result.is_ok();
                self.register.on_result(result);
                if ok {
                    self.login.set_notice(REGISTERED_MESSAGE);
                    self.navigate(Route::Login);
                }
            }

            AppEvent::ActivitiesLoaded(result) => {
                if self.expired(&result) {
                    return;
                }
                let result = result.map_err(|e| {
                    warn!("Loading activities failed: {}", e);
                    ActivityError::LoadFailed
                });
                self.activities.on_loaded(result.clone());
                self.activity_table.on_loaded(result);
            }
            AppEvent::MyActivitiesLoaded(result) => {
                if self.expired(&result) {
                    return;
                }
                self.my_activities.on_loaded(result.map_err(|e| {
                    warn!("Loading attendance records failed: {}", e);
                    LOAD_ERROR_MESSAGE.to_string()
                }));
            }
            AppEvent::ActivityCreated(result) => {
                if self.expired(&result) {
                    return;
                }
                self.activity_form.on_created(result.map_err(|e| {
                    warn!("Creating activity failed: {}", e);
                    ActivityError::CreateFailed
                }));
            }
            AppEvent::ActivityUpdated(result) => {
                if self.expired(&result) {
                    return;
                }
                self.activity_table.on_updated(result.map_err(|e| {
                    warn!("Updating activity failed: {}", e);
                    ActivityError::UpdateFailed
                }));
            }
            AppEvent::ActivityDeactivated(result) => {
                if self.expired(&result) {
                    return;
                }
                self.activity_table.on_deactivated(result.map_err(|e| {
                    warn!("Deactivating activity failed: {}", e);
                    ActivityError::DeactivateFailed
                }));
            }
            AppEvent::ActivityDeleted(id, result) => {
                if self.expired(&result) {
                    return;
                }
                self.activity_table.on_deleted(
                    id,
                    result.map_err(|e| {
                        warn!("Deleting activity {} failed: {}", id, e);
                        ActivityError::DeleteFailed
                    }),
                );
            }
            AppEvent::QrSaved(kind, result) => {
                self.activity_table
                    .on_qr_saved(kind, result.as_deref().map_err(Clone::clone));
            }
        }
    }

    /// A 401 on an authenticated call means the token is no longer
    /// accepted: drop the session and go back to the login screen.
    fn expired<T>(&mut self, result: &Result<T, ApiError>) -> bool {
        match result {
            Err(e) if e.is_unauthorized() && self.session.is_some() => {
                warn!("Service rejected the session token");
                self.logout();
                self.login.set_notice(SESSION_EXPIRED_MESSAGE);
                true
            }
            _ => false,
        }
    }

    fn on_login(&mut self, result: Result<String, ApiError>) {
        let token = match result {
            Ok(token) => token,
            Err(e) => {
                warn!("Login failed: {}", e);
                self.login.on_result(Err(if e.is_unauthorized() {
                    LoginError::InvalidCredentials
                } else {
                    LoginError::ConnectionError
                }));
                return;
            }
        };

        let session = match Session::from_token(&token) {
            Ok(session) => session,
            Err(e) => {
                warn!("Login token rejected: {}", e);
                self.login.on_result(Err(LoginError::InvalidToken));
                return;
            }
        };

        if let Err(e) = self.store.save(&session) {
            warn!("Session will not survive a restart: {}", e);
        }
        info!(
            "Logged in as user {} ({})",
            session.user_id(),
            session.role()
        );

        let role = session.role();
        self.session = Some(session);
        self.login.on_result(Ok(()));
        self.participant.arm_instructions();
        self.navigate(home(Some(role)));
    }

    /// The single way out of a session.
    pub fn logout(&mut self) {
        lock(&self.scan).teardown();
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear session file: {}", e);
        }
        if let Some(session) = self.session.take() {
            info!("User {} logged out", session.user_id());
        }

        self.participant = ParticipantHome::new();
        self.admin = Menu::admin();
        self.activities = ActivitiesScreen::default();
        self.activity_table = ActivityTableScreen::default();
        self.activity_form = RegisterActivityScreen::new();
        self.my_activities = MyActivitiesScreen::default();
        self.qr_reader.reset();
        self.login = LoginScreen::new();

        self.navigate(Route::Login);
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub fn navigate(&mut self, target: Route) {
        let role = self.session.as_ref().map(Session::role);
        let route = resolve(role, target);
        if route != target {
            debug!("{} redirected to {}", target.path(), route.path());
        }

        if self.route == Route::QrReader && route != Route::QrReader {
            lock(&self.scan).teardown();
            self.qr_reader.reset();
        }

        let entering = route != self.route;
        self.route = route;

        match route {
            Route::Activities | Route::ActivityTable => self.perform(Action::LoadActivities),
            Route::MyActivities => self.perform(Action::LoadMyActivities),
            Route::QrReader if entering => self.perform(Action::ProbeCamera),
            _ => {}
        }
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.session.is_some() {
            match key.code {
                KeyCode::F(1) => return self.navigate(Route::Participant),
                KeyCode::F(2) => return self.navigate(Route::Activities),
                KeyCode::F(3) => return self.navigate(Route::Admin),
                KeyCode::F(10) => return self.logout(),
                _ => {}
            }
        }

        let action = match self.route {
            Route::Login => self.login.handle_key(key),
            Route::Register => self.register.handle_key(key),
            Route::Participant => self.participant.handle_key(key),
            Route::Admin => self.admin.handle_key(key),
            Route::Activities => self.activities.handle_key(key),
            Route::ActivityTable => self.activity_table.handle_key(key),
            Route::RegisterActivity => self.activity_form.handle_key(key),
            Route::MyActivities => self.my_activities.handle_key(key),
            Route::QrReader => {
                let machine = lock(&self.scan);
                self.qr_reader.handle_key(key, &machine)
            }
        };

        if let Some(action) = action {
            self.perform(action);
        }
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    pub fn perform(&mut self, action: Action) {
        debug!("Action {:?}", ActionName(&action));

        match action {
            Action::Navigate(route) => self.navigate(route),

            Action::Login(data) => {
                let api = self.api.clone();
                self.spawn(async move { AppEvent::LoginFinished(api.login(&data).await) });
            }
            Action::Register(data) => {
                let api = self.api.clone();
                self.spawn(async move { AppEvent::RegisterFinished(api.register(&data).await) });
            }

            Action::LoadActivities => {
                let Some(session) = self.session.clone() else { return };
                self.activities.begin_load();
                self.activity_table.begin_load();
                let api = self.api.clone();
                self.spawn(async move {
                    AppEvent::ActivitiesLoaded(api.list_activities(&session).await)
                });
            }
            Action::LoadMyActivities => {
                let Some(session) = self.session.clone() else { return };
                self.my_activities.begin_load();
                let api = self.api.clone();
                self.spawn(async move {
                    AppEvent::MyActivitiesLoaded(api.my_activities_with_details(&session).await)
                });
            }
            Action::CreateActivity(form) => {
                let Some(session) = self.session.clone() else { return };
                let api = self.api.clone();
                self.spawn(async move {
                    AppEvent::ActivityCreated(api.create_activity(&session, &form).await)
                });
            }
            Action::UpdateActivity { id, update } => {
                let Some(session) = self.session.clone() else { return };
                let api = self.api.clone();
                self.spawn(async move {
                    AppEvent::ActivityUpdated(api.update_activity(&session, id, &update).await)
                });
            }
            Action::DeactivateActivity { id, update } => {
                let Some(session) = self.session.clone() else { return };
                let api = self.api.clone();
                self.spawn(async move {
                    AppEvent::ActivityDeactivated(api.update_activity(&session, id, &update).await)
                });
            }
            Action::DeleteActivity(id) => {
                let Some(session) = self.session.clone() else { return };
                let api = self.api.clone();
                self.spawn(async move {
                    AppEvent::ActivityDeleted(id, api.delete_activity(&session, id).await)
                });
            }
            Action::DownloadQr { id, kind } => {
                let Some(session) = self.session.clone() else { return };
                let api = self.api.clone();
                let dir = self.download_dir.clone();
                self.spawn(async move {
                    AppEvent::QrSaved(kind, download_qr(&api, &session, id, kind, &dir).await)
                });
            }

            Action::ProbeCamera => {
                let driver = self.driver.clone();
                let machine = self.scan.clone();
                self.spawn(async move {
                    driver.probe(&machine).await;
                    AppEvent::CameraProbed
                });
            }
            Action::StartScan => self.start_scan(),
            Action::StopScan => {
                lock(&self.scan).cancel();
            }
            Action::ScanModal(choice) => {
                let chosen = lock(&self.scan).dismiss_modal(choice);
                match chosen {
                    Some(ModalAction::ScanAgain) => self.start_scan(),
                    Some(ModalAction::GoToMyActivities) => self.navigate(Route::MyActivities),
                    None => {}
                }
            }
            Action::KeyboardLine(line) => match &self.keyboard {
                Some(feed) => {
                    if !feed.submit(line) {
                        warn!("Keyboard reader is gone");
                    }
                }
                None => debug!("Ignoring typed line without a keyboard reader"),
            },
        }
    }

    fn start_scan(&mut self) {
        let Some(session) = self.session.clone() else {
            return;
        };
        let ticket = match lock(&self.scan).start() {
            Ok(ticket) => ticket,
            Err(e) => {
                debug!("Scan not started: {:?}", e);
                return;
            }
        };

        self.qr_reader.reset();
        let driver = self.driver.clone();
        let machine = self.scan.clone();
        self.spawn(async move {
            driver.run(&machine, ticket, &session).await;
            AppEvent::ScanSettled
        });
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let events = self.events.clone();
        tokio::spawn(async move {
            let event = task.await;
            if events.send(event).is_err() {
                debug!("Event loop gone; dropping task result");
            }
        });
    }
}

/// Logs actions without their payloads; login and registration carry
/// passwords.
struct ActionName<'a>(&'a Action);

impl std::fmt::Debug for ActionName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self.0 {
            Action::Navigate(route) => return write!(f, "Navigate({})", route.path()),
            Action::Login(_) => "Login",
            Action::Register(_) => "Register",
            Action::LoadActivities => "LoadActivities",
            Action::LoadMyActivities => "LoadMyActivities",
            Action::CreateActivity(_) => "CreateActivity",
            Action::UpdateActivity { id, .. } => return write!(f, "UpdateActivity({})", id),
            Action::DeactivateActivity { id, .. } => {
                return write!(f, "DeactivateActivity({})", id);
            }
            Action::DeleteActivity(id) => return write!(f, "DeleteActivity({})", id),
            Action::DownloadQr { id, kind } => {
                return write!(f, "DownloadQr({}, {})", id, kind.file_suffix());
            }
            Action::ProbeCamera => "ProbeCamera",
            Action::StartScan => "StartScan",
            Action::StopScan => "StopScan",
            Action::ScanModal(_) => "ScanModal",
            Action::KeyboardLine(_) => "KeyboardLine",
        };
        f.write_str(name)
    }
}

/// `<dir>/atividade-<id>-<entrada|saida>.png`
pub fn qr_file_path(dir: &Path, id: i64, kind: QrKind) -> PathBuf {
    dir.join(format!("atividade-{}-{}.png", id, kind.file_suffix()))
}

async fn download_qr(
    api: &ApiClient,
    session: &Session,
    id: i64,
    kind: QrKind,
    dir: &Path,
) -> Result<PathBuf, ActivityError> {
    let bytes = api.qr_image(session, id, kind).await.map_err(|e| {
        warn!("Fetching {} of activity {} failed: {}", kind.title(), id, e);
        ActivityError::QrImageUnavailable
    })?;

    let path = qr_file_path(dir, id, kind);
    let write = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, &bytes).await
    };
    write.await.map_err(|e| {
        error!("Writing {} failed: {}", path.display(), e);
        ActivityError::QrSaveFailed(path.display().to_string())
    })?;

    info!("Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

/// Read terminal input on a plain thread; crossterm's reader blocks.
fn spawn_input_reader(events: mpsc::UnboundedSender<AppEvent>) {
    std::thread::spawn(move || {
        loop {
            let event = match crossterm::event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
                Ok(Event::Resize(..)) => AppEvent::Resize,
                Ok(_) => continue,
                Err(e) => {
                    error!("Terminal input failed: {}", e);
                    break;
                }
            };
            if events.send(event).is_err() {
                break;
            }
        }
    });
}
