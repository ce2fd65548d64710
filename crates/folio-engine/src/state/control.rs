use std::collections::VecDeque;
use std::rc::Rc;

use log::{debug, trace};

use folio_config::FixPolicy;

use crate::errors::{EngineError, EngineResult};
use crate::model::{Document, NodeConfig};
use crate::mutation::{Mutation, MutationOutcome, apply_mutation_with_view_delta, make_remove_range_mutation};
use crate::scope::{ScopeArena, ScopeId};
use crate::segment::{Granularity, Segmenter};
use crate::selection::{Selection, normalize_selection};
use crate::state::config::StateControlConfig;
use crate::state::history::{History, StateSnapshot, transform_selection};
use crate::view_delta::{ViewControl, ViewDeltaControl};

/// A queued update callback.
pub type Update = Box<dyn FnOnce(&mut Delta<'_>) -> EngineResult<()>>;

type AfterBatchListener = Box<dyn FnMut(&State)>;

/// The live document and selection.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    document: Rc<Document>,
    selection: Selection,
    custom_collapsed_selection_text_config: Option<NodeConfig>,
}

impl State {
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Shared handle on the live document; cloning it is O(1).
    pub fn document_rc(&self) -> Rc<Document> {
        Rc::clone(&self.document)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Text config applied to the next insertion at a collapsed caret.
    pub fn custom_collapsed_selection_text_config(&self) -> Option<&NodeConfig> {
        self.custom_collapsed_selection_text_config.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Queued,
    Running,
}

/// Batches updates against the live state and records their history.
pub struct StateControl {
    config: StateControlConfig,
    state: State,
    history: History,
    queue: VecDeque<Update>,
    phase: Phase,
    view_delta: ViewDeltaControl,
    view_control: Option<Box<dyn ViewControl>>,
    scopes: ScopeArena,
    after_batch_listeners: Vec<(ScopeId, AfterBatchListener)>,
}

impl StateControl {
    pub fn new(config: StateControlConfig, document: Document, selection: Selection) -> EngineResult<Self> {
        selection.validate(&document)?;
        let selection = normalize_selection(&document, &selection, &config.normalize_options())?;
        Ok(Self {
            config,
            state: State {
                document: Rc::new(document),
                selection,
                custom_collapsed_selection_text_config: None,
            },
            history: History::new(),
            queue: VecDeque::new(),
            phase: Phase::Idle,
            view_delta: ViewDeltaControl::new(),
            view_control: None,
            scopes: ScopeArena::new(),
            after_batch_listeners: Vec::new(),
        })
    }

    pub fn config(&self) -> &StateControlConfig {
        &self.config
    }

    /// Live read view.
    pub fn state_view(&self) -> &State {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn bind_view_control(&mut self, view_control: Box<dyn ViewControl>) -> EngineResult<()> {
        if self.view_control.is_some() {
            return Err(EngineError::AlreadyInitializedProperty("view_control"));
        }
        self.view_control = Some(view_control);
        Ok(())
    }

    pub fn scopes(&mut self) -> &mut ScopeArena {
        &mut self.scopes
    }

    /// Run `listener` after every batch while `scope` is active.
    pub fn add_after_batch_listener(&mut self, scope: ScopeId, listener: impl FnMut(&State) + 'static) {
        self.after_batch_listeners.push((scope, Box::new(listener)));
    }

    /// Queue `update` for the next batch. Nothing runs until the host flushes
    /// the queue with [`StateControl::run_updates`], typically once per event
    /// loop turn.
    pub fn queue_update(&mut self, update: impl FnOnce(&mut Delta<'_>) -> EngineResult<()> + 'static) {
        self.queue.push_back(Box::new(update));
        if self.phase == Phase::Idle {
            self.phase = Phase::Queued;
        }
    }

    /// Run every queued update as one batch.
    ///
    /// A failing update stops the batch: mutations already committed stay
    /// applied and recorded, the view delta gathered so far is still
    /// delivered, and the updates behind it remain queued.
    pub fn run_updates(&mut self) -> EngineResult<()> {
        if self.queue.is_empty() {
            self.phase = Phase::Idle;
            return Ok(());
        }
        self.phase = Phase::Running;
        debug!("running batch of {} queued updates", self.queue.len());

        let mut committed = 0;
        let mut updates_run = 0;
        let mut result = Ok(());
        while let Some(update) = self.queue.pop_front() {
            updates_run += 1;
            let mut delta = Delta {
                config: &self.config,
                state: &mut self.state,
                history: &mut self.history,
                queue: &mut self.queue,
                view_delta: &mut self.view_delta,
                committed: &mut committed,
            };
            if let Err(error) = update(&mut delta) {
                result = Err(error);
                break;
            }
        }

        self.flush_view_delta();
        self.notify_after_batch_listeners();
        self.phase = if self.queue.is_empty() {
            Phase::Idle
        } else {
            Phase::Queued
        };
        debug!("batch finished after {updates_run} updates with {committed} committed mutations");
        result
    }

    fn flush_view_delta(&mut self) {
        if self.view_delta.is_empty() {
            return;
        }
        let view_delta = self.view_delta.take();
        trace!("flushing {} view delta records", view_delta.len());
        if let Some(view_control) = self.view_control.as_mut() {
            view_control.apply_view_delta(view_delta);
        }
    }

    fn notify_after_batch_listeners(&mut self) {
        let scopes = &self.scopes;
        self.after_batch_listeners
            .retain(|(scope, _)| scopes.is_active(*scope));
        for (_, listener) in &mut self.after_batch_listeners {
            listener(&self.state);
        }
    }

    /// Capture the current mutation id. Reading through it later gives the
    /// state as of now.
    pub fn snapshot_state(&self) -> StateSnapshot {
        self.history.snapshot()
    }

    pub fn document_at(&self, snapshot: StateSnapshot) -> EngineResult<Rc<Document>> {
        self.history.document_at(&self.state.document, snapshot.mutation_id())
    }

    pub fn selection_at(&self, snapshot: StateSnapshot) -> EngineResult<Selection> {
        self.history.selection_at(&self.state.selection, snapshot.mutation_id())
    }

    /// Carry a selection captured at `from` forward to `to`. `None` uses the
    /// configured policy.
    pub fn transform_selection_forwards(
        &self,
        selection: &Selection,
        from: StateSnapshot,
        to: StateSnapshot,
        fix_policy: Option<FixPolicy>,
    ) -> EngineResult<Selection> {
        self.history.transform_selection_forwards(
            &self.state.document,
            selection,
            from,
            to,
            fix_policy.unwrap_or(self.config.time_travel_fix_policy),
            &self.config.normalize_options(),
        )
    }

    pub fn segmenter(&self, granularity: Granularity) -> EngineResult<Box<dyn Segmenter>> {
        let factory = self
            .config
            .segmenter_factory
            .as_ref()
            .ok_or_else(|| EngineError::NotImplementedCode("no segmenter factory configured".to_string()))?;
        factory.make(&self.config.locale, granularity)
    }
}

/// Mutation façade handed to update callbacks. It only exists inside a
/// running batch.
pub struct Delta<'a> {
    config: &'a StateControlConfig,
    state: &'a mut State,
    history: &'a mut History,
    queue: &'a mut VecDeque<Update>,
    view_delta: &'a mut ViewDeltaControl,
    committed: &'a mut usize,
}

impl Delta<'_> {
    pub fn state(&self) -> &State {
        self.state
    }

    pub fn document(&self) -> &Document {
        &self.state.document
    }

    pub fn selection(&self) -> &Selection {
        &self.state.selection
    }

    pub fn current_mutation_id(&self) -> u64 {
        self.history.current_mutation_id()
    }

    /// Apply a mutation and carry the live selection across it. Returns
    /// whether anything changed.
    pub fn apply_mutation(&mut self, mutation: impl Into<Mutation>) -> EngineResult<bool> {
        self.apply_mutation_and_transform_given_selections(mutation, &mut [])
    }

    /// Like [`Delta::apply_mutation`], also carrying `selections` across.
    pub fn apply_mutation_and_transform_given_selections(
        &mut self,
        mutation: impl Into<Mutation>,
        selections: &mut [Selection],
    ) -> EngineResult<bool> {
        let mutation = mutation.into();
        let document = Rc::make_mut(&mut self.state.document);
        let MutationOutcome::Changed {
            reverse_mutation,
            transform,
        } = apply_mutation_with_view_delta(document, &mutation, self.view_delta)?
        else {
            return Ok(false);
        };

        let selection_before = self.state.selection.clone();
        let live = transform_selection(&self.state.selection, transform.as_ref());
        let given: Vec<Selection> = selections
            .iter()
            .map(|selection| transform_selection(selection, transform.as_ref()))
            .collect();
        self.history
            .push(mutation, reverse_mutation, selection_before, transform);
        *self.committed += 1;

        let options = self.config.normalize_options();
        self.state.selection = normalize_selection(&self.state.document, &live, &options)?;
        for (selection, transformed) in selections.iter_mut().zip(given) {
            *selection = normalize_selection(&self.state.document, &transformed, &options)?;
        }
        Ok(true)
    }

    /// Run another update right away, inside this batch.
    pub fn apply_update(&mut self, update: impl FnOnce(&mut Delta<'_>) -> EngineResult<()>) -> EngineResult<()> {
        update(self)
    }

    /// Queue an update to run later in this same batch.
    pub fn queue_update(&mut self, update: impl FnOnce(&mut Delta<'_>) -> EngineResult<()> + 'static) {
        self.queue.push_back(Box::new(update));
    }

    /// Replace the live selection. Clears the custom collapsed text config.
    pub fn set_selection(&mut self, selection: Selection) -> EngineResult<()> {
        selection.validate(&self.state.document)?;
        self.state.selection =
            normalize_selection(&self.state.document, &selection, &self.config.normalize_options())?;
        self.state.custom_collapsed_selection_text_config = None;
        Ok(())
    }

    pub fn set_custom_collapsed_selection_text_config(&mut self, config: Option<NodeConfig>) {
        self.state.custom_collapsed_selection_text_config = config;
    }

    /// Delete everything the live selection covers. Every range present on
    /// entry is removed once, where it lies after the removals before it.
    pub fn remove_selection_contents(&mut self) -> EngineResult<bool> {
        let entry_ranges: Vec<(String, String)> = self
            .state
            .selection
            .selection_ranges
            .iter()
            .flat_map(|selection_range| {
                selection_range
                    .ranges
                    .iter()
                    .map(|range| (selection_range.id.clone(), range.id.clone()))
            })
            .collect();
        let mut changed = false;
        for (selection_range_id, range_id) in entry_ranges {
            let Some(range) = self
                .state
                .selection
                .selection_range(&selection_range_id)
                .and_then(|selection_range| selection_range.range(&range_id))
            else {
                continue;
            };
            let can_remove = self.config.can_content_be_removed_when_removing_selection.as_ref();
            if let Some(mutation) = make_remove_range_mutation(&self.state.document, range, can_remove)? {
                changed |= self.apply_mutation(mutation)?;
            }
        }
        Ok(changed)
    }
}
