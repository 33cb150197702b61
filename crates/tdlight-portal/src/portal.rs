//! The session controller and its configuration and database actions.

use tdlight_client::PortalClient;
use tdlight_common::Result;
use tdlight_config::Settings;
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};

use crate::channel::ChannelSet;
use crate::notice::{Notice, NoticeKind, NoticeLevel};
use crate::state::{AppState, PendingQueue};

/// One user session against one backend.
pub struct Portal {
    pub(crate) client: PortalClient,
    pub(crate) settings: Settings,
    pub(crate) state: AppState,
    pub(crate) channels: ChannelSet,
    notice_tx: broadcast::Sender<Notice>,
}

impl Portal {
    pub fn new(client: PortalClient, settings: Settings) -> Self {
        let (notice_tx, _) = broadcast::channel(256);
        let mut state = AppState::default();
        state.config_form.threads = settings.import.threads.to_string();
        state.config_form.vgroups = settings.import.vgroups.to_string();
        state.import_form.nside = settings.import.nside.to_string();
        state.import_form.batch_size = settings.auto_classify.batch_size.to_string();
        Self {
            client,
            settings,
            state,
            channels: ChannelSet::new(),
            notice_tx,
        }
    }

    pub fn from_settings(settings: Settings) -> Result<Self> {
        let client = PortalClient::new(&settings.backend)?;
        Ok(Self::new(client, settings))
    }

    pub fn client(&self) -> &PortalClient {
        &self.client
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notice_tx.subscribe()
    }

    pub(crate) fn notify(&mut self, kind: NoticeKind) {
        let notice = Notice::new(kind);
        match notice.level {
            NoticeLevel::Error   => warn!(notice = %notice.kind, "Notice"),
            NoticeLevel::Warning => info!(notice = %notice.kind, "Notice"),
            _                    => debug!(notice = %notice.kind, "Notice"),
        }
        self.state.push_notice(notice.clone());
        let _ = self.notice_tx.send(notice);
    }

    // ── Start-up ────────────────────────────────────────────

    /// Seed the import database from the backend config unless the user
    /// already chose one.
    #[instrument(skip(self))]
    pub async fn init(&mut self) {
        if !self.state.import_form.db_name().is_empty() {
            return;
        }
        match self.client.fetch_config().await {
            Ok(cfg) => {
                self.state.import_form.db_name = cfg
                    .database_name()
                    .unwrap_or(&self.settings.import.default_db)
                    .to_string();
                info!(db_name = %self.state.import_form.db_name, "Import database seeded");
            }
            Err(e) => warn!(error = %e, "Initial config fetch failed"),
        }
    }

    // ── Configuration ───────────────────────────────────────

    /// Fill the settings form from the backend. On failure the form keeps
    /// its current values.
    #[instrument(skip(self))]
    pub async fn load_config(&mut self) -> bool {
        let cfg = match self.client.fetch_config().await {
            Ok(cfg) => cfg,
            Err(e) => {
                error!(error = %e, "Failed to load backend config");
                self.notify(NoticeKind::ConfigLoadFailed(e.user_message()));
                return false;
            }
        };
        self.state.config_form.fill_from(&cfg);

        match self.client.list_databases().await {
            Ok(list) => {
                self.state.databases = list.user_databases().into_iter().map(str::to_string).collect();
                self.state.current_database = cfg
                    .database_name()
                    .filter(|name| list.databases.iter().any(|db| db == name))
                    .map(str::to_string);
            }
            Err(e) => warn!(error = %e, "Failed to load database list"),
        }

        self.notify(NoticeKind::ConfigLoaded);
        true
    }

    #[instrument(skip(self))]
    pub async fn save_config(&mut self) -> bool {
        let update = self.state.config_form.to_update(true);
        match self.client.save_config(&update).await.and_then(|ack| ack.into_result()) {
            Ok(_) => {
                info!(db_name = %update.db_name, "Backend config saved");
                self.notify(NoticeKind::ConfigSaved);
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to save backend config");
                self.notify(NoticeKind::ConfigSaveFailed(e.user_message()));
                false
            }
        }
    }

    /// Save the form without import settings, then have the backend reload.
    #[instrument(skip(self))]
    pub async fn apply_config(&mut self) -> bool {
        let update = self.state.config_form.to_update(false);
        if let Err(e) = self.client.save_config(&update).await.and_then(|ack| ack.into_result()) {
            error!(error = %e, "Failed to save backend config");
            self.notify(NoticeKind::ConfigSaveFailed(e.user_message()));
            return false;
        }
        match self.client.reload_config().await.and_then(|ack| ack.into_result()) {
            Ok(_) => {
                info!("Backend config applied");
                self.notify(NoticeKind::ConfigApplied);
                true
            }
            Err(e) => {
                error!(error = %e, "Backend config reload failed");
                self.notify(NoticeKind::ConfigApplyFailed(e.user_message()));
                false
            }
        }
    }

    /// Have the backend re-read its config file, then copy the database
    /// name and HEALPix nside into the import form.
    #[instrument(skip(self))]
    pub async fn sync_config_from_file(&mut self) -> bool {
        let reloaded = self.client.reload_config().await.and_then(|ack| ack.into_result());
        let result = match reloaded {
            Ok(_) => self.client.fetch_config().await,
            Err(e) => Err(e),
        };
        let cfg = match result {
            Ok(cfg) => cfg,
            Err(e) => {
                error!(error = %e, "Config sync failed");
                self.notify(NoticeKind::ConfigSyncFailed(e.user_message()));
                return false;
            }
        };

        if let Some(name) = cfg.database_name() {
            self.state.import_form.db_name = name.to_string();
        }
        if let Some(nside) = cfg.healpix.nside.filter(|&n| n > 0) {
            self.state.import_form.nside = nside.to_string();
        }
        self.notify(NoticeKind::ConfigSynced {
            db_name: cfg.database_name().unwrap_or_default().to_string(),
        });
        self.on_db_name_change().await;
        true
    }

    // ── Databases ───────────────────────────────────────────

    #[instrument(skip(self))]
    pub async fn refresh_databases(&mut self) -> bool {
        match self.client.list_databases().await {
            Ok(list) => {
                let user: Vec<String> = list.user_databases().into_iter().map(str::to_string).collect();
                self.state.current_database = list.current.clone();
                self.state.databases = user;
                if self.state.databases.is_empty() {
                    self.notify(NoticeKind::NoUserDatabases);
                } else {
                    let count = self.state.databases.len();
                    self.notify(NoticeKind::DatabasesRefreshed { count });
                }
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to list databases");
                self.notify(NoticeKind::DatabaseListFailed(e.user_message()));
                false
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn drop_database(&mut self, db_name: &str) -> bool {
        let db_name = db_name.trim();
        if db_name.is_empty() {
            self.notify(NoticeKind::NoDatabaseChosen);
            return false;
        }
        match self.client.drop_database(db_name).await.and_then(|ack| ack.into_result()) {
            Ok(_) => {
                info!(db_name, "Database dropped");
                self.notify(NoticeKind::DatabaseDropped { name: db_name.to_string() });
                self.refresh_databases().await;
                true
            }
            Err(e) => {
                error!(error = %e, db_name, "Failed to drop database");
                self.notify(NoticeKind::DatabaseDropFailed(e.user_message()));
                false
            }
        }
    }

    // ── Pending queue ───────────────────────────────────────

    /// Query how many light curves await auto-classification. With
    /// `run_check` the backend first rescans the database. Returns the
    /// count, or 0 when the query failed.
    #[instrument(skip(self))]
    pub async fn refresh_pending_count(&mut self, run_check: bool) -> u64 {
        let mut db_name = self.state.import_form.db_name().to_string();

        if run_check {
            match self.client.check_pending(&db_name).await.and_then(|ack| ack.into_result()) {
                Ok(ack) => {
                    if let Some(name) = ack.db_name.filter(|n| !n.is_empty()) {
                        db_name = name;
                    }
                }
                Err(e) => {
                    error!(error = %e, "Pending check failed");
                    self.notify(NoticeKind::PendingCheckFailed(e.user_message()));
                }
            }
        }

        match self.client.candidates(&db_name).await {
            Ok(candidates) => {
                let db_name = candidates.db_name.filter(|n| !n.is_empty()).unwrap_or(db_name);
                let queue = PendingQueue::new(
                    db_name,
                    candidates.count,
                    self.state.import_form.batch_size_value(),
                );
                debug!(db_name = %queue.db_name, count = queue.count, batches = queue.batches, "Pending queue");
                let count = queue.count;
                self.state.pending = Some(queue);
                count
            }
            Err(e) => {
                warn!(error = %e, "Failed to read pending candidates");
                self.state.pending = None;
                0
            }
        }
    }

    /// Re-read the existing queue for the import database without a rescan.
    #[instrument(skip(self))]
    pub async fn on_db_name_change(&mut self) -> u64 {
        let db_name = self.state.import_form.db_name().to_string();
        if db_name.is_empty() {
            self.state.pending = None;
            return 0;
        }
        match self.client.candidates(&db_name).await {
            Ok(candidates) => {
                let queue = PendingQueue::new(
                    db_name,
                    candidates.count,
                    self.state.import_form.batch_size_value(),
                );
                let count = queue.count;
                self.state.pending = Some(queue);
                count
            }
            Err(e) => {
                warn!(error = %e, "Failed to read pending candidates");
                self.state.pending = None;
                0
            }
        }
    }
}

impl Drop for Portal {
    fn drop(&mut self) {
        self.channels.close_all();
    }
}
