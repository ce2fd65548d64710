use std::path::Path;
use std::rc::Rc;

use anyhow::Context;
use folio_config::{FixPolicy, Settings};

use crate::model::{ContentReference, Document};
use crate::mutation::removal::CanContentBeRemovedFn;
use crate::segment::SegmenterFactory;
use crate::selection::{FixSelectionRangeFn, NormalizeOptions, keep_selection_range};

/// Host hooks and limits for a [`StateControl`](crate::state::StateControl).
#[derive(Clone)]
pub struct StateControlConfig {
    pub can_content_be_removed_when_removing_selection: Rc<CanContentBeRemovedFn>,
    pub fix_selection_range: Rc<FixSelectionRangeFn>,
    pub segmenter_factory: Option<Rc<dyn SegmenterFactory>>,
    pub locale: String,
    pub max_selection_fix_passes: usize,
    pub time_travel_fix_policy: FixPolicy,
}

fn never_remove_content(_document: &Document, _content_reference: &ContentReference) -> bool {
    false
}

impl Default for StateControlConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl StateControlConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            can_content_be_removed_when_removing_selection: Rc::new(never_remove_content),
            fix_selection_range: Rc::new(keep_selection_range),
            segmenter_factory: None,
            locale: settings.locale.clone(),
            max_selection_fix_passes: settings.max_selection_fix_passes,
            time_travel_fix_policy: settings.time_travel_fix_policy,
        }
    }

    /// Build from a settings file, using defaults when it does not exist.
    pub fn load_from_path(config_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_path = config_path.as_ref();
        let settings = Settings::load_from_path(config_path)
            .with_context(|| format!("loading engine settings from {}", config_path.display()))?
            .unwrap_or_default();
        Ok(Self::from_settings(&settings))
    }

    pub fn with_fix_selection_range(mut self, fix_selection_range: Rc<FixSelectionRangeFn>) -> Self {
        self.fix_selection_range = fix_selection_range;
        self
    }

    pub fn with_can_content_be_removed(mut self, can_content_be_removed: Rc<CanContentBeRemovedFn>) -> Self {
        self.can_content_be_removed_when_removing_selection = can_content_be_removed;
        self
    }

    pub fn with_segmenter_factory(mut self, segmenter_factory: Rc<dyn SegmenterFactory>) -> Self {
        self.segmenter_factory = Some(segmenter_factory);
        self
    }

    pub fn normalize_options(&self) -> NormalizeOptions<'_> {
        NormalizeOptions {
            fix_selection_range: self.fix_selection_range.as_ref(),
            max_fix_passes: self.max_selection_fix_passes,
        }
    }
}
