//! Pass orchestration: settings snapshots, the visited set, the revert
//! ledger and the command queue that serialises rescans and restores.

use std::collections::{HashSet, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::config::{EngineConfig, RoundingMode, Settings};
use crate::errors::{Result, RounderError};
use crate::ledger::{ContainerState, FieldMap, RevertLedger};
use crate::matcher::PriceMatcher;
use crate::rewriter::{self, ContainerRewrite};

/// Host-side view of the page: settings, content enumeration, and write-back
/// of restored originals.
pub trait ContentHost<Id> {
    /// Polled once at the start of every pass.
    fn settings(&self) -> Settings;

    /// Calls `visit` for every candidate container under `scope`, or the whole
    /// document when `scope` is `None`. When `visit` returns new content the
    /// host must display it in place of the old.
    fn for_each_content_span(
        &mut self,
        scope: Option<&Id>,
        visit: &mut dyn FnMut(&Id, &ContainerState) -> Option<ContainerState>,
    );

    /// Puts `original` back. Returns [`RounderError::StaleContainer`] when the
    /// identity no longer resolves.
    fn restore(&mut self, id: &Id, original: &ContainerState) -> Result<()>;
}

/// State owned by a single processing pass.
#[derive(Debug)]
pub struct ProcessingContext<Id> {
    pass_id: Uuid,
    settings: Settings,
    visited: HashSet<Id>,
    applied: usize,
}

impl<Id: Eq + Hash> ProcessingContext<Id> {
    pub fn new(settings: Settings) -> Self {
        Self {
            pass_id: Uuid::new_v4(),
            settings,
            visited: HashSet::new(),
            applied: 0,
        }
    }

    pub fn pass_id(&self) -> Uuid {
        self.pass_id
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Prices rewritten so far in this pass.
    pub fn applied(&self) -> usize {
        self.applied
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Marks `id` as seen. Returns `false` if it was already seen in this pass.
    fn visit(&mut self, id: Id) -> bool {
        self.visited.insert(id)
    }
}

/// Outcome of processing one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult<T> {
    pub changed: bool,
    pub new_content: T,
}

/// Work items for the single-threaded processing loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<Id> {
    /// Scan the whole document.
    FullScan,
    /// Scan newly inserted or mutated content under one container.
    RescanSubtree(Id),
    /// Restore everything, then rescan if the host is still enabled.
    SettingsChanged,
    /// Restore everything and stop.
    Restore,
}

/// Summary reported to the settings UI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub enabled: bool,
    pub mode: RoundingMode,
    pub processed_count: usize,
}

/// The price rounding core for one page session.
pub struct PriceEngine<Id> {
    matcher: PriceMatcher,
    ledger: RevertLedger<Id>,
    settings: Settings,
    applied_count: usize,
    queue: VecDeque<Command<Id>>,
}

impl<Id: Clone + Eq + Hash + Debug> PriceEngine<Id> {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        Ok(Self {
            matcher: PriceMatcher::new(&config.matcher)?,
            ledger: RevertLedger::new(),
            settings: Settings::default(),
            applied_count: 0,
            queue: VecDeque::new(),
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(&EngineConfig::default())
    }

    pub fn matcher(&self) -> &PriceMatcher {
        &self.matcher
    }

    pub fn ledger(&self) -> &RevertLedger<Id> {
        &self.ledger
    }

    /// Opens a pass with a fresh visited set and a snapshot of `settings`.
    pub fn begin_pass(&mut self, settings: Settings) -> ProcessingContext<Id> {
        self.settings = settings;
        let ctx = ProcessingContext::new(settings);
        debug!(pass_id = %ctx.pass_id, mode = %settings.mode, enabled = settings.enabled, "pass started");
        ctx
    }

    /// Rewrites the prices in one free-text container.
    pub fn process_span(
        &mut self,
        ctx: &mut ProcessingContext<Id>,
        id: Id,
        text: &str,
    ) -> RewriteResult<String> {
        let rewrite = self.process_container(ctx, &id, &ContainerState::Plain(text.to_string()));
        match rewrite.state {
            ContainerState::Plain(new_text) => RewriteResult {
                changed: rewrite.applied > 0,
                new_content: new_text,
            },
            ContainerState::Structured(_) => RewriteResult {
                changed: false,
                new_content: text.to_string(),
            },
        }
    }

    /// Rewrites a multi-field price widget.
    pub fn process_structured_widget(
        &mut self,
        ctx: &mut ProcessingContext<Id>,
        id: Id,
        fields: &FieldMap,
    ) -> RewriteResult<FieldMap> {
        let rewrite = self.process_container(ctx, &id, &ContainerState::Structured(fields.clone()));
        match rewrite.state {
            ContainerState::Structured(new_fields) => RewriteResult {
                changed: rewrite.applied > 0,
                new_content: new_fields,
            },
            ContainerState::Plain(_) => RewriteResult {
                changed: false,
                new_content: fields.clone(),
            },
        }
    }

    fn process_container(
        &mut self,
        ctx: &mut ProcessingContext<Id>,
        id: &Id,
        content: &ContainerState,
    ) -> ContainerRewrite {
        let untouched = ContainerRewrite {
            state: content.clone(),
            applied: 0,
        };
        if !ctx.settings.enabled {
            return untouched;
        }
        if matches!(content, ContainerState::Structured(_)) && !ctx.settings.structured_widgets {
            trace!(pass_id = %ctx.pass_id, ?id, "structured widgets disabled");
            return untouched;
        }
        if !ctx.visit(id.clone()) {
            trace!(pass_id = %ctx.pass_id, ?id, "container already visited in this pass");
            return untouched;
        }
        if self.ledger.contains(id) {
            trace!(pass_id = %ctx.pass_id, ?id, "container already rewritten");
            return untouched;
        }

        let rewrite = rewriter::rewrite_container(content, &self.matcher, ctx.settings.mode);
        if rewrite.changed() {
            self.ledger.record_if_absent(id.clone(), content.clone());
            ctx.applied += rewrite.applied;
            self.applied_count += rewrite.applied;
            debug!(pass_id = %ctx.pass_id, ?id, applied = rewrite.applied, "container rewritten");
        }
        rewrite
    }

    /// Runs one pass over `scope` (or the whole document) of `host`.
    /// Returns the number of prices rewritten.
    pub fn scan(&mut self, host: &mut dyn ContentHost<Id>, scope: Option<&Id>) -> usize {
        let settings = host.settings();
        let mut ctx = self.begin_pass(settings);
        if !settings.enabled {
            debug!(pass_id = %ctx.pass_id, "rounding disabled, pass skipped");
            return 0;
        }
        host.for_each_content_span(scope, &mut |id: &Id, content: &ContainerState| {
            let rewrite = self.process_container(&mut ctx, id, content);
            rewrite.changed().then_some(rewrite.state)
        });
        info!(
            pass_id = %ctx.pass_id,
            visited = ctx.visited_count(),
            applied = ctx.applied,
            "pass finished"
        );
        ctx.applied
    }

    /// Drains the ledger, returning every original in first-edit order.
    /// The applied counter starts again from zero.
    pub fn restore_all(&mut self) -> Vec<(Id, ContainerState)> {
        let restored = self.ledger.restore_all();
        self.applied_count = 0;
        info!(containers = restored.len(), "originals restored");
        restored
    }

    /// Restores every original through `host`, skipping containers that have
    /// disappeared. Returns how many were written back.
    ///
    /// A container the host fails to restore for any other reason still shows
    /// rounded text, so its original goes back into the ledger and later
    /// passes leave it alone until a restore succeeds.
    pub fn restore_into(&mut self, host: &mut dyn ContentHost<Id>) -> usize {
        let mut written = 0;
        for (id, original) in self.restore_all() {
            match host.restore(&id, &original) {
                Ok(()) => written += 1,
                Err(RounderError::StaleContainer(reason)) => {
                    debug!(?id, %reason, "stale container skipped during restore");
                }
                Err(err) => {
                    warn!(?id, error = %err, "restore failed, original kept");
                    self.ledger.record_if_absent(id, original);
                }
            }
        }
        written
    }

    /// Prices currently rewritten and not yet restored.
    pub fn applied_count(&self) -> usize {
        self.applied_count
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            enabled: self.settings.enabled,
            mode: self.settings.mode,
            processed_count: self.applied_count,
        }
    }

    pub fn enqueue(&mut self, command: Command<Id>) {
        trace!(?command, "command queued");
        self.queue.push_back(command);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Processes queued commands in order until the queue is empty. A restore
    /// always completes before any later scan starts. Returns the number of
    /// prices rewritten.
    pub fn run_pending(&mut self, host: &mut dyn ContentHost<Id>) -> usize {
        let mut applied = 0;
        while let Some(command) = self.queue.pop_front() {
            match command {
                Command::FullScan => applied += self.scan(host, None),
                Command::RescanSubtree(scope) => applied += self.scan(host, Some(&scope)),
                Command::SettingsChanged => {
                    self.restore_into(host);
                    let settings = host.settings();
                    self.settings = settings;
                    if settings.enabled {
                        applied += self.scan(host, None);
                    }
                }
                Command::Restore => {
                    self.restore_into(host);
                }
            }
        }
        applied
    }
}
