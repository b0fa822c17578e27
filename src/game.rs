//! Numbered-region game engine.
//!
//! Owns the live fill state for one play session: which regions have been
//! attempted, which are correct, the selection/hint/zoom view state, and
//! completion. Persistence goes through the injected
//! [`PersistenceGateway`]; time comes from an injected [`Clock`] so the
//! engine stays deterministic under test.
//!
//! Correctness is recomputed here from the template on every attempt —
//! callers report which color the user applied, never whether it was
//! right.

use crate::error::{PaintError, Result};
use crate::persistence::{
    Artwork, ArtworkContent, Draft, PersistenceGateway, StoreKind, from_record, to_record,
};
use crate::svg_generator::{render_progress_svg, svg_data_url};
use crate::template::Template;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 4.0;

/// How long an incorrect-fill feedback stays visible before the host's
/// timer should expire it.
pub const FEEDBACK_EXPIRY_MS: u64 = 1000;

pub trait Clock {
    fn now_millis(&self) -> u64;
}

/// Wall-clock milliseconds since the Unix epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// One attempt on a region. At most one entry per region exists at a time;
/// the latest attempt overwrites earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilledRegion {
    pub region_id: String,
    /// The number the user applied.
    pub color_number: u32,
    pub is_correct: bool,
    pub filled_at: u64,
}

/// Ephemeral view/selection state. Not part of the persisted artwork;
/// reset whenever a new game starts.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub selected_color_number: Option<u32>,
    pub is_hint_active: bool,
    pub hint_region_id: Option<String>,
    pub show_numbers: bool,
    pub zoom_level: f32,
    pub pan_x: f32,
    pub pan_y: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            selected_color_number: None,
            is_hint_active: false,
            hint_region_id: None,
            show_numbers: true,
            zoom_level: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Incorrect,
    Completed,
}

/// User-visible feedback event. Correct fills stay silent on purpose —
/// only wrong answers and completion interrupt.
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub region_id: Option<String>,
    /// Monotonic per-session sequence; [`GameEngine::expire_feedback`]
    /// only clears a matching sequence, so a stale timer can never blank
    /// out newer feedback.
    pub seq: u64,
    pub expires_at: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillOutcome {
    Correct,
    Incorrect,
    /// This fill completed the puzzle (takes priority over per-click
    /// feedback).
    Completed,
    /// Region id not present in the active template.
    UnknownRegion,
    /// No active template, or the session is already completed.
    Rejected,
}

pub struct GameEngine {
    template: Option<Template>,
    filled: HashMap<String, FilledRegion>,
    view: ViewState,
    mistakes_count: u32,
    is_completed: bool,
    is_dirty: bool,
    started_at: u64,
    last_saved_at: Option<u64>,
    artwork_id: Option<String>,
    feedback: Option<Feedback>,
    feedback_seq: u64,
    clock: Box<dyn Clock>,
}

impl GameEngine {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        GameEngine {
            template: None,
            filled: HashMap::new(),
            view: ViewState::default(),
            mistakes_count: 0,
            is_completed: false,
            is_dirty: false,
            started_at: 0,
            last_saved_at: None,
            artwork_id: None,
            feedback: None,
            feedback_seq: 0,
            clock,
        }
    }

    pub fn with_system_clock() -> Self {
        Self::new(Box::new(SystemClock))
    }

    /// Begin a fresh attempt at `template`: fills, mistakes, completion and
    /// view state all reset, color #1 selected. Resuming prior progress is
    /// a separate, explicit `load_progress` call.
    pub fn start_game(&mut self, template: Template) {
        if let Err(e) = template.validate() {
            log::warn!("starting game on inconsistent template {}: {}", template.id, e);
        }
        self.filled.clear();
        self.mistakes_count = 0;
        self.is_completed = false;
        self.is_dirty = false;
        self.started_at = self.clock.now_millis();
        self.last_saved_at = None;
        self.artwork_id = None;
        self.feedback = None;
        self.view = ViewState {
            selected_color_number: Some(1),
            ..ViewState::default()
        };
        self.template = Some(template);
    }

    /// Pure selection update. Exhausted colors are selectable — the UI
    /// discourages it, the engine does not care.
    pub fn set_selected_color(&mut self, color_number: Option<u32>) {
        self.view.selected_color_number = color_number;
    }

    /// True once the region holds a correct fill. Correct fills are sticky:
    /// callers use this to turn further taps on the region into no-ops.
    pub fn is_region_filled(&self, region_id: &str) -> bool {
        self.filled.get(region_id).is_some_and(|f| f.is_correct)
    }

    /// Apply the user's color to a region. Correctness is derived from the
    /// template, the entry overwrites any previous attempt, and completion
    /// is detected when every region holds a correct fill.
    pub fn fill_region(&mut self, region_id: &str, color_number: u32) -> FillOutcome {
        let Some(template) = self.template.as_ref() else {
            return FillOutcome::Rejected;
        };
        if self.is_completed {
            return FillOutcome::Rejected;
        }
        let Some(correct_color) = template.correct_color(region_id) else {
            log::warn!("fill on unknown region {}", region_id);
            return FillOutcome::UnknownRegion;
        };

        let is_correct = color_number == correct_color;
        let now = self.clock.now_millis();
        let region_count = template.region_count as usize;

        self.filled.insert(
            region_id.to_string(),
            FilledRegion {
                region_id: region_id.to_string(),
                color_number,
                is_correct,
                filled_at: now,
            },
        );
        self.is_dirty = true;

        if !is_correct {
            self.mistakes_count += 1;
        }

        if region_count > 0 && self.correct_count() == region_count {
            self.is_completed = true;
            self.feedback_seq += 1;
            self.feedback = Some(Feedback {
                kind: FeedbackKind::Completed,
                region_id: None,
                seq: self.feedback_seq,
                expires_at: None,
            });
            return FillOutcome::Completed;
        }

        if is_correct {
            FillOutcome::Correct
        } else {
            self.feedback_seq += 1;
            self.feedback = Some(Feedback {
                kind: FeedbackKind::Incorrect,
                region_id: Some(region_id.to_string()),
                seq: self.feedback_seq,
                expires_at: Some(now + FEEDBACK_EXPIRY_MS),
            });
            FillOutcome::Incorrect
        }
    }

    /// Expire the feedback carrying `seq`. A timer firing late finds a
    /// newer sequence and does nothing — that is the whole point.
    pub fn expire_feedback(&mut self, seq: u64) {
        if self
            .feedback
            .as_ref()
            .is_some_and(|f| f.seq == seq && f.expires_at.is_some())
        {
            self.feedback = None;
        }
    }

    /// Remove the most recently *timestamped* entry (explicitly by
    /// `filled_at`, not insertion order). No-op on an empty map or a
    /// completed session.
    pub fn undo_last_fill(&mut self) -> Option<FilledRegion> {
        if self.is_completed {
            return None;
        }
        let last_id = self
            .filled
            .values()
            .max_by(|a, b| {
                a.filled_at
                    .cmp(&b.filled_at)
                    .then_with(|| a.region_id.cmp(&b.region_id))
            })?
            .region_id
            .clone();
        let removed = self.filled.remove(&last_id);
        if removed.is_some() {
            self.is_dirty = true;
        }
        removed
    }

    /// Toggle the hint: when activating, point at the first unfilled region
    /// matching the selected color, falling back to the first unfilled
    /// region overall.
    pub fn toggle_hint(&mut self) {
        if self.view.is_hint_active {
            self.view.is_hint_active = false;
            self.view.hint_region_id = None;
            return;
        }

        let hint_id = {
            let Some(template) = self.template.as_ref() else {
                return;
            };
            let regions = &template.template_data.regions;
            let by_color = self.view.selected_color_number.and_then(|color| {
                regions
                    .iter()
                    .find(|r| r.color_number == color && !self.is_region_filled(&r.id))
            });
            by_color
                .or_else(|| regions.iter().find(|r| !self.is_region_filled(&r.id)))
                .map(|r| r.id.clone())
        };

        if let Some(id) = hint_id {
            self.view.hint_region_id = Some(id);
            self.view.is_hint_active = true;
        }
    }

    pub fn get_progress(&self) -> u32 {
        let Some(template) = self.template.as_ref() else {
            return 0;
        };
        if template.region_count == 0 {
            return 0;
        }
        (100.0 * self.correct_count() as f64 / template.region_count as f64).round() as u32
    }

    /// Regions of this color still waiting for a correct fill. Clamped at
    /// zero: going negative means the stored data disagrees with the
    /// template, which is logged and tolerated rather than propagated.
    pub fn get_remaining_count(&self, color_number: u32) -> u32 {
        let Some(template) = self.template.as_ref() else {
            return 0;
        };
        let total = template
            .palette_color(color_number)
            .map(|c| c.total_regions)
            .unwrap_or(0);
        let used = self
            .filled
            .values()
            .filter(|f| f.is_correct && f.color_number == color_number)
            .count() as u32;
        if used > total {
            log::warn!(
                "remaining count for color {} underflows: {} correct fills, {} declared",
                color_number,
                used,
                total
            );
            return 0;
        }
        total - used
    }

    /// The template's true answer for a region — hint rendering only.
    pub fn get_correct_color(&self, region_id: &str) -> Option<u32> {
        self.template.as_ref()?.correct_color(region_id)
    }

    fn correct_count(&self) -> usize {
        self.filled.values().filter(|f| f.is_correct).count()
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.view.zoom_level = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn set_pan(&mut self, x: f32, y: f32) {
        self.view.pan_x = x;
        self.view.pan_y = y;
    }

    pub fn toggle_show_numbers(&mut self) {
        self.view.show_numbers = !self.view.show_numbers;
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    pub fn filled_regions(&self) -> &HashMap<String, FilledRegion> {
        &self.filled
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn mistakes_count(&self) -> u32 {
        self.mistakes_count
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn last_saved_at(&self) -> Option<u64> {
        self.last_saved_at
    }

    pub fn artwork_id(&self) -> Option<&str> {
        self.artwork_id.as_deref()
    }

    fn session_content(&self) -> ArtworkContent {
        let mut entries: Vec<FilledRegion> = self.filled.values().cloned().collect();
        entries.sort_by(|a, b| {
            a.filled_at
                .cmp(&b.filled_at)
                .then_with(|| a.region_id.cmp(&b.region_id))
        });
        ArtworkContent::NumberedRegion {
            filled_regions: entries,
            mistakes_count: self.mistakes_count,
        }
    }

    /// Durable save. Updates the session's artwork record (or the most
    /// recent one for this template, or creates one), then clears the
    /// dirty flag. A failed write leaves in-memory state untouched and the
    /// session dirty so the user can retry.
    pub fn save_progress(&mut self, gateway: &mut dyn PersistenceGateway) -> Result<String> {
        let template = self
            .template
            .as_ref()
            .ok_or_else(|| PaintError::validation("template", "no active game"))?;

        let now = self.clock.now_millis();
        let content = self.session_content();
        let thumbnail = svg_data_url(&render_progress_svg(template, &self.filled));
        let progress = self.get_progress();

        let existing: Option<Artwork> = match &self.artwork_id {
            Some(id) => gateway
                .get(StoreKind::Artworks, id)?
                .map(from_record)
                .transpose()?,
            None => {
                let mut candidates: Vec<Artwork> = gateway
                    .query_by_index(StoreKind::Artworks, "templateId", &template.id)?
                    .into_iter()
                    .filter_map(|v| from_record(v).ok())
                    .collect();
                candidates.sort_by_key(|a| a.updated_at);
                candidates.pop()
            }
        };

        let artwork = match existing {
            Some(mut artwork) => {
                artwork.content = content;
                artwork.progress = progress;
                artwork.thumbnail_data_url = thumbnail;
                artwork.updated_at = now;
                artwork.is_synced = false;
                artwork
            }
            None => Artwork {
                id: new_artwork_id(now),
                template_id: template.id.clone(),
                title: template.title.clone(),
                thumbnail_data_url: thumbnail,
                content,
                progress,
                created_at: now,
                updated_at: now,
                is_synced: false,
            },
        };

        gateway.put(StoreKind::Artworks, &artwork.id, to_record(&artwork)?)?;

        self.artwork_id = Some(artwork.id.clone());
        self.is_dirty = false;
        self.last_saved_at = Some(now);
        Ok(artwork.id)
    }

    /// Rehydrate fills and mistakes from a stored artwork. Entries for
    /// regions the template does not know are dropped with a warning —
    /// stored progress must never become unloadable over a minor
    /// inconsistency. Correctness flags are recomputed from the template
    /// rather than trusted.
    pub fn load_progress(
        &mut self,
        gateway: &dyn PersistenceGateway,
        artwork_id: &str,
    ) -> Result<()> {
        let answers: HashMap<String, u32> = {
            let template = self
                .template
                .as_ref()
                .ok_or_else(|| PaintError::validation("template", "no active game"))?;
            template
                .template_data
                .regions
                .iter()
                .map(|r| (r.id.clone(), r.color_number))
                .collect()
        };
        let region_count = self.template.as_ref().map(|t| t.region_count).unwrap_or(0) as usize;

        let value = gateway
            .get(StoreKind::Artworks, artwork_id)?
            .ok_or_else(|| PaintError::persistence(format!("artwork {} not found", artwork_id)))?;
        let artwork: Artwork = from_record(value)?;

        match artwork.content {
            ArtworkContent::NumberedRegion {
                filled_regions,
                mistakes_count,
            } => {
                let mut map = HashMap::new();
                for mut entry in filled_regions {
                    match answers.get(&entry.region_id) {
                        Some(&correct_color) => {
                            entry.is_correct = entry.color_number == correct_color;
                            map.insert(entry.region_id.clone(), entry);
                        }
                        None => log::warn!(
                            "dropping stored fill for unknown region {}",
                            entry.region_id
                        ),
                    }
                }

                let correct = map.values().filter(|f| f.is_correct).count();
                self.filled = map;
                self.mistakes_count = mistakes_count;
                self.is_completed = region_count > 0 && correct == region_count;
                self.artwork_id = Some(artwork.id);
                self.is_dirty = false;
                self.feedback = None;
                Ok(())
            }
            ArtworkContent::Freehand { .. } => Err(PaintError::persistence(
                "artwork holds a freehand canvas, not numbered-region progress",
            )),
        }
    }

    /// Resume the most recently updated artwork for the active template.
    pub fn load_progress_by_template(
        &mut self,
        gateway: &dyn PersistenceGateway,
        template_id: &str,
    ) -> Result<()> {
        let mut candidates: Vec<Artwork> = gateway
            .query_by_index(StoreKind::Artworks, "templateId", template_id)?
            .into_iter()
            .filter_map(|v| from_record(v).ok())
            .collect();
        candidates.sort_by_key(|a| a.updated_at);
        let latest = candidates
            .pop()
            .ok_or_else(|| PaintError::persistence(format!("no artwork for {}", template_id)))?;
        self.load_progress(gateway, &latest.id)
    }

    /// Autosave tick: overwrite this template's draft. Does not touch the
    /// dirty flag — a draft is a resume point, not an explicit save.
    pub fn save_draft(&self, gateway: &mut dyn PersistenceGateway) -> Result<()> {
        let template = self
            .template
            .as_ref()
            .ok_or_else(|| PaintError::validation("template", "no active game"))?;
        let draft = Draft {
            template_id: template.id.clone(),
            content: self.session_content(),
            updated_at: self.clock.now_millis(),
        };
        gateway.put(StoreKind::Drafts, &template.id, to_record(&draft)?)
    }

    /// Pick up the draft for the active template, if one exists.
    pub fn load_draft(&mut self, gateway: &dyn PersistenceGateway) -> Result<bool> {
        let (template_id, answers, region_count) = {
            let template = self
                .template
                .as_ref()
                .ok_or_else(|| PaintError::validation("template", "no active game"))?;
            let answers: HashMap<String, u32> = template
                .template_data
                .regions
                .iter()
                .map(|r| (r.id.clone(), r.color_number))
                .collect();
            (
                template.id.clone(),
                answers,
                template.region_count as usize,
            )
        };

        let Some(value) = gateway.get(StoreKind::Drafts, &template_id)? else {
            return Ok(false);
        };
        let draft: Draft = from_record(value)?;

        match draft.content {
            ArtworkContent::NumberedRegion {
                filled_regions,
                mistakes_count,
            } => {
                let mut map = HashMap::new();
                for mut entry in filled_regions {
                    if let Some(&correct_color) = answers.get(&entry.region_id) {
                        entry.is_correct = entry.color_number == correct_color;
                        map.insert(entry.region_id.clone(), entry);
                    } else {
                        log::warn!("dropping draft fill for unknown region {}", entry.region_id);
                    }
                }
                let correct = map.values().filter(|f| f.is_correct).count();
                self.filled = map;
                self.mistakes_count = mistakes_count;
                self.is_completed = region_count > 0 && correct == region_count;
                Ok(true)
            }
            ArtworkContent::Freehand { .. } => Err(PaintError::persistence(
                "draft holds a freehand canvas, not numbered-region progress",
            )),
        }
    }
}

fn new_artwork_id(now: u64) -> String {
    let nonce: u32 = rand::thread_rng().gen_range(0..=0xffff_ffff);
    format!("artwork-{:012x}-{:08x}", now, nonce)
}

#[cfg(test)]
mod tests {
    include!("game_tests.rs");
}
