//! One handler per subcommand. Each returns whether the operation
//! succeeded; failures have already been printed as notices.

use std::path::Path;

use console::style;
use tdlight_client::ImportKind;
use tdlight_common::progress::JobOutcome;
use tdlight_common::JobKind;
use tdlight_portal::display::MetadataView;
use tdlight_portal::{JobUpdate, Notice, Portal, SearchMode};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::cli::{
    AutoCommand, Command, ConfigCommand, ConfigFields, DatabaseCommand, ImportArgs, ImportCommand,
    SearchTarget,
};
use crate::render;

pub struct Session {
    portal: Portal,
    notices: broadcast::Receiver<Notice>,
}

impl Session {
    pub fn new(portal: Portal) -> Self {
        let notices = portal.subscribe();
        Self { portal, notices }
    }

    fn flush(&mut self) {
        render::drain_notices(&mut self.notices, None);
    }

    pub async fn run(&mut self, command: Command) -> bool {
        let ok = match command {
            Command::Config(cmd)                 => self.config(cmd).await,
            Command::Databases(cmd)              => self.databases(cmd).await,
            Command::Search { target, append_ids, export, map } => {
                self.search(target, &append_ids, export.as_deref(), map).await
            }
            Command::Lightcurve { source_id, export } => {
                self.light_curve(&source_id, export.as_deref()).await
            }
            Command::Classify { target, skip }   => self.classify(target, &skip).await,
            Command::Import(cmd)                 => self.import(cmd).await,
            Command::Auto(cmd)                   => self.auto(cmd).await,
        };
        self.flush();
        ok
    }

    // ── Config ──────────────────────────────────────────────

    async fn config(&mut self, cmd: ConfigCommand) -> bool {
        match cmd {
            ConfigCommand::Show => {
                if !self.portal.load_config().await {
                    return false;
                }
                self.flush();
                let state = self.portal.state();
                let form = &state.config_form;
                for (label, value) in [
                    ("db_name", &form.db_name),
                    ("db_host", &form.db_host),
                    ("db_port", &form.db_port),
                    ("db_user", &form.db_user),
                    ("threads", &form.threads),
                    ("vgroups", &form.vgroups),
                    ("threshold", &form.threshold),
                    ("model_path", &form.model_path),
                ] {
                    println!("{:>12}  {}", style(label).bold(), value);
                }
                if !state.databases.is_empty() {
                    println!("{:>12}  {}", style("databases").bold(), state.databases.join(", "));
                }
                true
            }
            // Both start from the backend's values so unset flags keep them.
            ConfigCommand::Save { fields } => {
                if !self.portal.load_config().await {
                    return false;
                }
                self.apply_fields(fields);
                self.portal.save_config().await
            }
            ConfigCommand::Reload { fields } => {
                if !self.portal.load_config().await {
                    return false;
                }
                self.apply_fields(fields);
                self.portal.apply_config().await
            }
            ConfigCommand::Sync => {
                if !self.portal.sync_config_from_file().await {
                    return false;
                }
                let form = &self.portal.state().import_form;
                println!("{:>12}  {}", style("db_name").bold(), form.db_name);
                println!("{:>12}  {}", style("nside").bold(), form.nside);
                self.print_pending();
                true
            }
        }
    }

    fn apply_fields(&mut self, fields: ConfigFields) {
        let form = &mut self.portal.state_mut().config_form;
        let targets = [
            (fields.db_name, &mut form.db_name),
            (fields.db_host, &mut form.db_host),
            (fields.db_port, &mut form.db_port),
            (fields.db_user, &mut form.db_user),
            (fields.threads, &mut form.threads),
            (fields.vgroups, &mut form.vgroups),
            (fields.threshold, &mut form.threshold),
            (fields.model_path, &mut form.model_path),
        ];
        for (value, slot) in targets {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }

    // ── Databases ───────────────────────────────────────────

    async fn databases(&mut self, cmd: DatabaseCommand) -> bool {
        match cmd {
            DatabaseCommand::List => {
                if !self.portal.refresh_databases().await {
                    return false;
                }
                self.flush();
                for db in &self.portal.state().databases {
                    println!("  {}", db);
                }
                true
            }
            DatabaseCommand::Drop { name, yes } => {
                if !yes {
                    eprintln!(
                        "{} dropping {} deletes all of its data; pass --yes to confirm",
                        style("✖").red(),
                        style(&name).bold()
                    );
                    return false;
                }
                self.portal.drop_database(&name).await
            }
        }
    }

    // ── Search and viewing ──────────────────────────────────

    async fn run_search(&mut self, target: SearchTarget) -> usize {
        let mode = SearchMode::Replace;
        match target {
            SearchTarget::Cone { ra, dec, radius } => {
                self.portal.cone_search(ra, dec, radius, mode).await
            }
            SearchTarget::Region { ra_min, ra_max, dec_min, dec_max } => {
                self.portal.region_search(ra_min, ra_max, dec_min, dec_max, mode).await
            }
            SearchTarget::Ids { ids } => self.portal.search_ids(&ids.join("\n"), mode).await,
        }
    }

    async fn search(
        &mut self,
        target: SearchTarget,
        append_ids: &[String],
        export: Option<&Path>,
        map: bool,
    ) -> bool {
        let mut found = self.run_search(target).await;
        if !append_ids.is_empty() {
            found += self.portal.search_ids(&append_ids.join("\n"), SearchMode::Append).await;
        }
        if found == 0 && self.portal.state().selection.is_empty() {
            return false;
        }
        self.flush();
        render::print_objects(self.portal.state());
        if map {
            render::print_sky_map(self.portal.state());
        }
        match export {
            Some(dir) => self.portal.export_object_list(dir).is_some(),
            None => true,
        }
    }

    async fn light_curve(&mut self, source_id: &str, export: Option<&Path>) -> bool {
        if !self.portal.open_object(source_id).await {
            return false;
        }
        self.flush();

        let state = self.portal.state();
        let points = state.light_curve.as_ref().map_or(0, |c| c.points.len());
        if let Some(obj) = state.highlighted_object() {
            render::print_metadata(&MetadataView::new(obj, points));
        }
        if let Some(curve) = &state.light_curve {
            render::print_light_curve_summary(curve);
        }
        match export {
            Some(dir) => self.portal.export_light_curve(dir).is_some(),
            None => true,
        }
    }

    // ── Jobs ────────────────────────────────────────────────

    async fn classify(&mut self, target: SearchTarget, skip: &[String]) -> bool {
        if self.run_search(target).await == 0 {
            return false;
        }
        let selection = &mut self.portal.state_mut().selection;
        for id in skip {
            if !selection.set_selected(id, false) {
                warn!(source_id = %id, "Skipped id is not in the result list");
            }
        }
        self.flush();
        render::print_objects(self.portal.state());

        if !self.portal.start_classification().await {
            return false;
        }
        let finished = self.follow(JobKind::Classify).await;
        if finished && !self.portal.state().results.is_empty() {
            render::print_results(self.portal.state());
        }
        finished
    }

    async fn import(&mut self, cmd: ImportCommand) -> bool {
        let (kind, args) = match cmd {
            ImportCommand::Catalog(args)    => (ImportKind::Catalog, args),
            ImportCommand::Lightcurve(args) => (ImportKind::Lightcurve, args),
            ImportCommand::Stop             => return self.portal.stop_import().await,
        };

        self.portal.init().await;
        self.fill_import(kind, args);
        if !self.portal.start_import(kind).await {
            return false;
        }
        let finished = self.follow(JobKind::Import).await;
        if let Some(log) = &self.portal.state().progress(JobKind::Import).log {
            println!("{}", style(log).dim());
        }
        if finished {
            self.print_pending();
        }
        finished
    }

    fn fill_import(&mut self, kind: ImportKind, args: ImportArgs) {
        let state = self.portal.state_mut();
        let form = &mut state.import_form;
        match kind {
            ImportKind::Catalog    => form.catalog_path = args.path,
            ImportKind::Lightcurve => form.lightcurve_path = args.path,
        }
        form.coords_path = args.coords;
        if let Some(db) = args.db {
            form.db_name = db;
        }
        if let Some(nside) = args.nside {
            form.nside = nside;
        }
        if let Some(threads) = args.threads {
            state.config_form.threads = threads;
        }
        if let Some(vgroups) = args.vgroups {
            state.config_form.vgroups = vgroups;
        }
    }

    async fn auto(&mut self, cmd: AutoCommand) -> bool {
        self.portal.init().await;
        match cmd {
            AutoCommand::Check { db } => {
                self.set_db(db);
                self.portal.refresh_pending_count(true).await;
                self.print_pending();
                true
            }
            AutoCommand::Candidates { db } => {
                self.set_db(db);
                self.portal.on_db_name_change().await;
                self.print_pending();
                true
            }
            AutoCommand::Start { db, batch_size, resume } => {
                self.set_db(db);
                if let Some(size) = batch_size {
                    self.portal.state_mut().import_form.batch_size = size;
                }
                if !self.portal.start_auto_classify(resume).await {
                    return false;
                }
                self.follow(JobKind::AutoClassify).await
            }
            AutoCommand::Stop => self.portal.stop_auto_classify().await,
        }
    }

    fn set_db(&mut self, db: Option<String>) {
        if let Some(db) = db {
            self.portal.state_mut().import_form.db_name = db;
        }
    }

    fn print_pending(&mut self) {
        self.flush();
        match &self.portal.state().pending {
            Some(queue) => println!(
                "{} {} light curves pending in {} ({} batches)",
                style("●").cyan(),
                queue.count,
                style(&queue.db_name).bold(),
                queue.batches
            ),
            None => println!("{} no pending light curves", style("○").dim()),
        }
    }

    /// Draw `kind`'s progress until the job ends. Ctrl-C stops the job on
    /// the backend. Returns whether the job completed.
    async fn follow(&mut self, kind: JobKind) -> bool {
        self.flush();
        let bar = render::progress_bar(kind);
        let mut interrupted = false;

        loop {
            let update = tokio::select! {
                update = self.portal.next_update(kind) => update,
                _ = tokio::signal::ctrl_c() => {
                    interrupted = true;
                    None
                }
            };
            render::render_progress(&bar, kind, self.portal.state().progress(kind));
            render::drain_notices(&mut self.notices, Some(&bar));
            match update {
                Some(JobUpdate::Progress) => continue,
                Some(JobUpdate::Finished(outcome)) => {
                    bar.finish_and_clear();
                    self.flush();
                    return outcome == JobOutcome::Completed;
                }
                Some(JobUpdate::Disconnected) => {
                    bar.abandon();
                    println!(
                        "{} lost the {} progress stream; the job may still be running",
                        style("⚠").yellow(),
                        kind
                    );
                    return false;
                }
                None => break,
            }
        }

        bar.abandon();
        if interrupted {
            info!(%kind, "Interrupted, stopping job");
            match kind {
                JobKind::Classify     => self.portal.stop_classification().await,
                JobKind::Import       => self.portal.stop_import().await,
                JobKind::AutoClassify => self.portal.stop_auto_classify().await,
            };
        }
        self.flush();
        false
    }
}
