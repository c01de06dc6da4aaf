//! A level: the object arena plus the play / edit / playtest state machine
//!
//! The level owns every object. Everything else names objects by
//! [`ObjectId`], and ids are never reused, so replacing the arena on load
//! invalidates every outstanding reference at once.
//!
//! The level never talks to the network. Saves, publishes and telemetry are
//! queued as [`PendingRequest`]s; the host sends them in order and reports
//! back through [`Level::complete_request`] between frames.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde_json::Value;

use super::collision::{Collider, resolve_contacts};
use super::editor::{EditAction, EditorState, PointerSample, Tool, pointer_cell};
use super::input::InputState;
use super::level_data::{LevelData, LevelObject};
use super::object::{GameObject, ObjectId, ObjectKind, ObjectType};
use super::particles::ParticleEmitter;
use super::player::{Cosmetic, Icon, Player, Pose, TickOutcome};
use crate::consts::*;
use crate::persistence::request::{ApiError, ApiRequest, WipAction, decode};
use crate::renderer::canvas::DrawContext;
use crate::renderer::vertex::colors;
use crate::settings::Settings;

/// Id used for the editor's preview object, which never enters the arena
const GHOST_ID: ObjectId = ObjectId(u32::MAX);

/// Where a level's data lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSource {
    /// Built-in or in-memory level; nothing is fetched or saved
    Local,
    Published(u32),
    Draft(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelMode {
    Play,
    Edit { playtesting: bool },
}

impl LevelMode {
    /// Editing with the player parked at its start position
    pub fn is_designing(&self) -> bool {
        matches!(self, LevelMode::Edit { playtesting: false })
    }

    /// Whether the player simulates
    pub fn runs_physics(&self) -> bool {
        !self.is_designing()
    }
}

/// Things the host may want to react to, in the order they happened
#[derive(Debug, Clone, PartialEq)]
pub enum LevelEvent {
    Loaded,
    LoadFailed(String),
    PlayerDied,
    PlayerReset,
    Won,
    DirtyChanged(bool),
    PlaytestChanged(bool),
    ActionCompleted(WipAction),
    /// Blocking message for the user
    Alert(String),
}

/// What a queued request is for, so its outcome can be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    LoadData,
    FetchIcon,
    SetIcon,
    /// Carries the edit generation the saved data was built from
    SaveData { generation: u64 },
    Action(WipAction),
    MarkPlayed,
    MarkCleared,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub kind: RequestKind,
    pub request: ApiRequest,
}

pub struct Level {
    source: LevelSource,
    width: f32,
    height: f32,
    objects: Vec<GameObject>,
    next_id: u32,
    player: Option<ObjectId>,
    goal: Option<ObjectId>,
    data: LevelData,
    mode: LevelMode,
    editor: EditorState,
    settings: Settings,
    icon: Cosmetic,
    rng: Pcg32,

    loading: bool,
    error_message: Option<String>,
    winning: bool,
    dirty: bool,
    /// Bumped on every edit so a save only marks clean what it actually sent
    edit_generation: u64,
    /// Action to send once the save in flight succeeds
    deferred_action: Option<WipAction>,
    marked_played: bool,

    outbox: Vec<PendingRequest>,
    events: Vec<LevelEvent>,
}

impl Level {
    /// Create a level for a canvas of the given size. Server-backed levels
    /// queue their data fetch and stay in a loading state until it completes;
    /// local levels start with the default level.
    pub fn new(source: LevelSource, width: f32, height: f32, mode: LevelMode) -> Self {
        let mut level = Self {
            source,
            width,
            height,
            objects: Vec::new(),
            next_id: 1,
            player: None,
            goal: None,
            data: LevelData::default(),
            mode,
            editor: EditorState::default(),
            settings: Settings::default(),
            icon: Cosmetic::Pending,
            rng: Pcg32::seed_from_u64(0),
            loading: false,
            error_message: None,
            winning: false,
            dirty: false,
            edit_generation: 0,
            deferred_action: None,
            marked_played: false,
            outbox: Vec::new(),
            events: Vec::new(),
        };

        level.queue(RequestKind::FetchIcon, ApiRequest::user_icon());
        match source {
            LevelSource::Local => level.load_data(LevelData::default()),
            LevelSource::Published(id) => {
                level.loading = true;
                level.queue(RequestKind::LoadData, ApiRequest::level_data(id));
            }
            LevelSource::Draft(id) => {
                level.loading = true;
                level.queue(RequestKind::LoadData, ApiRequest::wip_level_data(id));
            }
        }
        log::info!("Level created ({source:?}, {mode:?}, {width}x{height})");
        level
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Seed for particle effects
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Pcg32::seed_from_u64(seed);
        self
    }

    // === Accessors ===

    pub fn source(&self) -> LevelSource {
        self.source
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn mode(&self) -> LevelMode {
        self.mode
    }

    pub fn objects(&self) -> &[GameObject] {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id == id)
    }

    pub fn player_object(&self) -> Option<&GameObject> {
        self.player.and_then(|id| self.object(id))
    }

    pub fn player(&self) -> Option<&Player> {
        self.player_object().and_then(GameObject::as_player)
    }

    pub fn goal_object(&self) -> Option<&GameObject> {
        self.goal.and_then(|id| self.object(id))
    }

    /// Level definition as last loaded or synced
    pub fn data(&self) -> &LevelData {
        &self.data
    }

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn icon(&self) -> Cosmetic {
        self.icon
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_winning(&self) -> bool {
        self.winning
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether navigating away would lose edits
    pub fn can_leave(&self) -> bool {
        !self.dirty
    }

    /// Requests to send, oldest first
    pub fn take_requests(&mut self) -> Vec<PendingRequest> {
        std::mem::take(&mut self.outbox)
    }

    pub fn drain_events(&mut self) -> Vec<LevelEvent> {
        std::mem::take(&mut self.events)
    }

    /// Canvas pixel (Y down) to world coordinates (Y up)
    pub fn screen_to_world(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(x, self.height - 1.0 - y)
    }

    // === Loading ===

    /// Replace the whole arena with a level definition. Illegal object types
    /// are logged and skipped.
    pub fn load_data(&mut self, mut data: LevelData) {
        self.objects.clear();
        self.player = None;
        self.goal = None;
        self.editor.reset();
        self.loading = false;
        self.error_message = None;
        self.winning = false;

        let player = Player {
            icon: self.icon,
            ..Player::new()
        };
        self.player = Some(self.spawn(ObjectKind::Player(player), data.player_x, data.player_y));

        if data.goal().is_none() && matches!(self.mode, LevelMode::Edit { .. }) {
            // Designers need a goal to drag into place
            data.set_goal(self.width - 3.0 * OBJECT_UNIT, OBJECT_UNIT);
        }
        if let Some((x, y)) = data.goal() {
            self.goal = Some(self.spawn(ObjectKind::Goal, x, y));
        }

        let mut skipped = 0;
        for obj in &data.objects {
            match ObjectKind::from_placeable(obj.ty) {
                Ok(kind) => {
                    self.spawn(kind, obj.x, obj.y);
                }
                Err(e) => {
                    log::error!("Skipping object at ({}, {}): {e}", obj.x, obj.y);
                    skipped += 1;
                }
            }
        }

        log::info!(
            "Loaded level: {} objects ({skipped} skipped)",
            data.objects.len() - skipped
        );
        self.data = data;
        self.set_dirty(false);
        self.events.push(LevelEvent::Loaded);

        if let (LevelMode::Play, LevelSource::Published(id)) = (self.mode, self.source) {
            if !self.marked_played {
                self.marked_played = true;
                self.queue(RequestKind::MarkPlayed, ApiRequest::mark_played(id));
            }
        }
    }

    /// Enter the terminal error state. No objects, no physics; the message
    /// is drawn instead.
    pub fn fail_load(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("Level failed to load: {message}");
        self.objects.clear();
        self.player = None;
        self.goal = None;
        self.editor.reset();
        self.loading = false;
        self.winning = false;
        self.error_message = Some(message.clone());
        self.events.push(LevelEvent::LoadFailed(message));
    }

    /// Put the player back on its start position with no motion
    pub fn reset(&mut self) {
        let start = Vec2::new(self.data.player_x, self.data.player_y);
        let Some(obj) = self.player.and_then(|id| self.object_mut(id)) else {
            return;
        };
        obj.x = start.x;
        obj.y = start.y;
        obj.rotation = 0.0;
        if let Some(player) = obj.as_player_mut() {
            player.reset_motion();
        }
        self.events.push(LevelEvent::PlayerReset);
    }

    fn spawn(&mut self, kind: ObjectKind, x: f32, y: f32) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.push(GameObject::new(id, kind, x, y));
        id
    }

    /// Add a particle burst centred on `at`
    pub fn spawn_particles(&mut self, at: Vec2, count: usize, life: f32, color: [f32; 4]) {
        if !self.settings.particles {
            return;
        }
        let emitter = ParticleEmitter::burst(&mut self.rng, count, life, color);
        self.spawn(ObjectKind::Particles(emitter), at.x, at.y);
    }

    // === Frame ===

    /// Advance one tick. `delta` is in 60ths of a second.
    pub fn tick(&mut self, delta: f32, input: &InputState) {
        if self.loading || self.error_message.is_some() {
            return;
        }
        if self.mode.is_designing() {
            self.tick_editor(input);
        }

        let physics = self.mode.runs_physics();
        // Objects spawned during this tick wait for the next one
        let count = self.objects.len();
        let mut spent = Vec::new();
        for i in 0..count {
            match self.objects[i].object_type() {
                ObjectType::Particles => {
                    let id = self.objects[i].id;
                    if let ObjectKind::Particles(emitter) = &mut self.objects[i].kind {
                        if !emitter.tick(delta) {
                            spent.push(id);
                        }
                    }
                }
                ObjectType::Player if physics => self.tick_player(i, delta, input),
                _ => {}
            }
        }
        if !spent.is_empty() {
            self.objects.retain(|o| !spent.contains(&o.id));
        }
    }

    fn tick_player(&mut self, index: usize, delta: f32, input: &InputState) {
        let this = &self.objects[index];
        let Some(player_box) = this.abs_hitbox() else {
            return;
        };
        let Some(speed) = this.as_player().map(|p| p.speed) else {
            return;
        };
        let player_id = this.id;

        let colliders: Vec<Collider> = self
            .objects
            .iter()
            .filter(|o| o.id != player_id)
            .filter_map(|o| {
                o.abs_hitbox().map(|hitbox| Collider {
                    hitbox,
                    collision: o.collision(),
                    origin: Vec2::new(o.x, o.y),
                })
            })
            .collect();
        let report = resolve_contacts(
            &player_box,
            speed,
            &colliders,
            self.size(),
            self.settings.tolerance,
        );

        let GameObject {
            x, y, rotation, kind, ..
        } = &mut self.objects[index];
        let ObjectKind::Player(player) = kind else {
            return;
        };
        let mut pose = Pose {
            pos: Vec2::new(*x, *y),
            rotation: *rotation,
        };
        let outcome = player.tick(&mut pose, &report, input, delta);
        if outcome == TickOutcome::Died {
            player.kill(&mut pose);
        }
        let started_win = match outcome {
            TickOutcome::ReachedGoal(goal) => player.begin_win(goal),
            _ => false,
        };
        *x = pose.pos.x;
        *y = pose.pos.y;
        *rotation = pose.rotation;

        let centre = pose.pos + Vec2::splat(OBJECT_UNIT / 2.0);
        match outcome {
            TickOutcome::Continue => {}
            TickOutcome::Died => {
                log::info!("Player died at ({:.0}, {:.0})", pose.pos.x, pose.pos.y);
                let color = self.settings.death_rgba();
                self.spawn_particles(centre, DEATH_PARTICLES, DEATH_PARTICLE_LIFE, color);
                self.events.push(LevelEvent::PlayerDied);
                self.reset();
            }
            TickOutcome::ReachedGoal(_) if started_win => {
                let color = self.settings.win_rgba();
                self.spawn_particles(centre, WIN_PARTICLES, WIN_PARTICLE_LIFE, color);
                self.win();
            }
            TickOutcome::ReachedGoal(_) => {}
        }
    }

    /// The player reached the goal. Completes the level in play mode and
    /// ends the playtest in the editor.
    pub fn win(&mut self) {
        match self.mode {
            LevelMode::Edit { playtesting: true } => {
                log::info!("Playtest cleared");
                self.stop_playtest();
            }
            LevelMode::Edit { playtesting: false } => {}
            LevelMode::Play => {
                if self.winning {
                    return;
                }
                self.winning = true;
                log::info!("Level complete");
                self.events.push(LevelEvent::Won);
                if let LevelSource::Published(id) = self.source {
                    self.queue(RequestKind::MarkCleared, ApiRequest::mark_cleared(id));
                }
            }
        }
    }

    /// Draw borders, then every object in insertion order, then overlays
    pub fn render(&self, ctx: &mut DrawContext) {
        let (w, h, u) = (self.width, self.height, OBJECT_UNIT);
        ctx.fill_rect(0.0, 0.0, w, u, colors::BORDER);
        ctx.fill_rect(0.0, h - u, w, u, colors::BORDER);
        ctx.fill_rect(0.0, 0.0, u, h, colors::BORDER);
        ctx.fill_rect(w - u, 0.0, u, h, colors::BORDER);

        if let Some(message) = &self.error_message {
            ctx.text(w / 2.0, h / 2.0, message, 24.0, colors::TEXT);
            return;
        }
        if self.loading {
            ctx.text(w / 2.0, h / 2.0, "Loading...", 24.0, colors::TEXT);
            return;
        }

        let reduced_motion = !self.settings.effective_squish();
        for obj in &self.objects {
            obj.render(ctx, reduced_motion);
        }

        if self.mode.is_designing() {
            if let Some(ghost) = self.editor.ghost {
                if let Ok(kind) = ObjectKind::from_placeable(ghost.ty) {
                    ctx.save();
                    ctx.set_alpha(0.5);
                    GameObject::new(GHOST_ID, kind, ghost.pos.x, ghost.pos.y).render(ctx, true);
                    ctx.restore();
                }
            }
            let focused = self.editor.focused().and_then(|id| self.object(id));
            if let Some(b) = focused.and_then(GameObject::grid_hitbox) {
                let outline = ctx.round_rect_path(b.x, b.y, b.width, b.height, 0.0);
                ctx.stroke_path(&outline, 2.0, colors::HIGHLIGHT, true);
            }
        }

        if self.winning {
            ctx.text(w / 2.0, h / 2.0, "Level complete!", 32.0, colors::TEXT);
        }
    }

    // === Editor ===

    pub fn set_tool(&mut self, tool: Tool) {
        self.editor.set_tool(tool);
    }

    pub fn set_snap(&mut self, snap: bool) {
        self.settings.snap_to_grid = snap;
    }

    /// First object whose grid cell contains the world point
    pub fn hit_test(&self, world: Vec2) -> Option<&GameObject> {
        self.objects.iter().find(|o| {
            o.grid_hitbox()
                .is_some_and(|b| b.contains(world.x, world.y))
        })
    }

    fn tick_editor(&mut self, input: &InputState) {
        let world = self.screen_to_world(input.mouse_x, input.mouse_y);
        let cell = pointer_cell(world, self.settings.snap_to_grid);
        let (hovered, hovered_deletable) = match self.hit_test(world) {
            Some(obj) => (Some(obj.id), obj.deletable()),
            None => (None, false),
        };
        let cell_occupied = self
            .objects
            .iter()
            .any(|o| o.grid_hitbox().is_some() && o.x == cell.x && o.y == cell.y);

        let sample = PointerSample {
            cell,
            down: input.mouse_down,
            hovered,
            hovered_deletable,
            cell_occupied,
        };
        if let Some(action) = self.editor.update(sample) {
            self.apply_edit(action);
        }
    }

    fn apply_edit(&mut self, action: EditAction) {
        match action {
            EditAction::Spawn { ty, pos } => match ObjectKind::from_placeable(ty) {
                Ok(kind) => {
                    self.spawn(kind, pos.x, pos.y);
                    self.mark_edited();
                }
                Err(e) => log::error!("Cannot place object: {e}"),
            },
            EditAction::Move { id, pos } => {
                let Some(obj) = self.object_mut(id) else {
                    // Dragged object is gone
                    self.editor.reset();
                    return;
                };
                if obj.x == pos.x && obj.y == pos.y {
                    return;
                }
                obj.x = pos.x;
                obj.y = pos.y;
                if self.player == Some(id) {
                    self.data.player_x = pos.x;
                    self.data.player_y = pos.y;
                } else if self.goal == Some(id) {
                    self.data.set_goal(pos.x, pos.y);
                }
                self.mark_edited();
            }
            EditAction::Delete(id) => {
                if let Some(i) = self.index_of(id) {
                    if self.objects[i].deletable() {
                        self.objects.remove(i);
                        self.mark_edited();
                    }
                }
            }
        }
    }

    fn mark_edited(&mut self) {
        self.edit_generation += 1;
        self.set_dirty(true);
    }

    fn set_dirty(&mut self, dirty: bool) {
        if self.dirty != dirty {
            self.dirty = dirty;
            self.events.push(LevelEvent::DirtyChanged(dirty));
        }
    }

    /// Start simulating from the designed start position
    pub fn start_playtest(&mut self) {
        if !self.mode.is_designing() {
            return;
        }
        self.mode = LevelMode::Edit { playtesting: true };
        self.editor.reset();
        self.winning = false;
        self.reset();
        log::info!("Playtest started");
        self.events.push(LevelEvent::PlaytestChanged(true));
    }

    /// Back to designing; the player returns to its start position
    pub fn stop_playtest(&mut self) {
        if self.mode != (LevelMode::Edit { playtesting: true }) {
            return;
        }
        self.mode = LevelMode::Edit { playtesting: false };
        self.winning = false;
        self.reset();
        log::info!("Playtest stopped");
        self.events.push(LevelEvent::PlaytestChanged(false));
    }

    pub fn toggle_playtest(&mut self) {
        match self.mode {
            LevelMode::Edit { playtesting: true } => self.stop_playtest(),
            LevelMode::Edit { playtesting: false } => self.start_playtest(),
            LevelMode::Play => {}
        }
    }

    /// Persisted object list rebuilt from the arena
    pub fn objects_data(&self) -> Vec<LevelObject> {
        self.objects
            .iter()
            .filter(|o| o.behavior().persisted)
            .map(|o| LevelObject {
                x: o.x,
                y: o.y,
                ty: o.object_type(),
            })
            .collect()
    }

    /// Bring `data` up to date with the arena
    pub fn sync_data(&mut self) -> &LevelData {
        self.data.objects = self.objects_data();
        &self.data
    }

    // === Persistence ===

    fn queue(&mut self, kind: RequestKind, request: ApiRequest) {
        log::debug!("Queued {} {}", request.method.as_str(), request.path);
        self.outbox.push(PendingRequest { kind, request });
    }

    fn raise_alert(&mut self, message: String) {
        log::warn!("{message}");
        self.events.push(LevelEvent::Alert(message));
    }

    /// Queue a save of the current design. Dirty is cleared only once the
    /// server accepts it.
    pub fn save(&mut self) -> bool {
        let LevelSource::Draft(id) = self.source else {
            log::warn!("Only drafts can be saved");
            return false;
        };
        self.sync_data();
        match ApiRequest::update_level_data(id, &self.data) {
            Ok(request) => {
                let generation = self.edit_generation;
                self.queue(RequestKind::SaveData { generation }, request);
                true
            }
            Err(e) => {
                self.raise_alert(format!("Could not save level: {e}"));
                false
            }
        }
    }

    /// Run a draft state transition, saving first when there are unsaved
    /// edits. The action is only sent after that save succeeds.
    pub fn run_action(&mut self, action: WipAction) -> bool {
        let LevelSource::Draft(id) = self.source else {
            log::warn!("{} needs a draft level", action.as_str());
            return false;
        };
        if self.dirty && action != WipAction::Delete {
            if !self.save() {
                return false;
            }
            self.deferred_action = Some(action);
            return true;
        }
        self.queue(RequestKind::Action(action), ApiRequest::wip_action(id, action));
        true
    }

    pub fn publish(&mut self) -> bool {
        self.run_action(WipAction::Publish)
    }

    pub fn unpublish(&mut self) -> bool {
        self.run_action(WipAction::Unpublish)
    }

    /// Apply a resolved icon preference to the player
    pub fn set_icon(&mut self, icon: Icon) {
        self.icon = Cosmetic::Resolved(icon);
        let cosmetic = self.icon;
        if let Some(player) = self
            .player
            .and_then(|id| self.object_mut(id))
            .and_then(GameObject::as_player_mut)
        {
            player.icon = cosmetic;
        }
    }

    /// Change the icon and store the preference
    pub fn choose_icon(&mut self, icon: Icon) {
        self.set_icon(icon);
        self.queue(RequestKind::SetIcon, ApiRequest::set_user_icon(icon));
    }

    /// Apply the outcome of a request previously taken from the outbox
    pub fn complete_request(&mut self, kind: RequestKind, result: Result<Value, ApiError>) {
        match (kind, result) {
            (RequestKind::LoadData, Ok(Value::Null)) => self.load_data(LevelData::default()),
            (RequestKind::LoadData, Ok(value)) => match decode::<LevelData>(value) {
                Ok(data) => self.load_data(data),
                Err(e) => self.fail_load(format!("Level data is corrupt: {e}")),
            },
            (RequestKind::LoadData, Err(e)) if e.is_not_found() => {
                self.fail_load("Level not found")
            }
            (RequestKind::LoadData, Err(e)) => self.fail_load(format!("Could not load level: {e}")),

            (RequestKind::FetchIcon, Ok(value)) => {
                let icon = value.as_str().map(Icon::from_name).unwrap_or_default();
                self.set_icon(icon);
            }
            (RequestKind::FetchIcon, Err(e)) => {
                log::warn!("Could not fetch player icon: {e}");
                self.set_icon(Icon::default());
            }
            (RequestKind::SetIcon, Ok(_)) => log::info!("Icon preference saved"),
            (RequestKind::SetIcon, Err(e)) => {
                self.raise_alert(format!("Could not save icon: {e}"))
            }

            (RequestKind::SaveData { generation }, Ok(_)) => {
                log::info!("Level saved");
                if generation == self.edit_generation {
                    self.set_dirty(false);
                }
                if let Some(action) = self.deferred_action.take() {
                    if let LevelSource::Draft(id) = self.source {
                        self.queue(RequestKind::Action(action), ApiRequest::wip_action(id, action));
                    }
                }
            }
            (RequestKind::SaveData { .. }, Err(e)) => {
                self.deferred_action = None;
                self.raise_alert(format!("Could not save level: {e}"));
            }

            (RequestKind::Action(action), Ok(_)) => {
                log::info!("Level {} done", action.as_str());
                self.events.push(LevelEvent::ActionCompleted(action));
            }
            (RequestKind::Action(action), Err(e)) => {
                self.raise_alert(format!("Could not {} level: {e}", action.as_str()))
            }

            (RequestKind::MarkPlayed | RequestKind::MarkCleared, Ok(_)) => {}
            (RequestKind::MarkPlayed, Err(e)) => {
                self.raise_alert(format!("Could not record play: {e}"))
            }
            (RequestKind::MarkCleared, Err(e)) => {
                self.raise_alert(format!("Could not record clear: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::request::Method;

    const W: f32 = 800.0;
    const H: f32 = 480.0;

    fn local_play(data: LevelData) -> Level {
        let mut level = Level::new(LevelSource::Local, W, H, LevelMode::Play);
        level.load_data(data);
        level.take_requests();
        level.drain_events();
        level
    }

    fn draft(data: LevelData) -> Level {
        let mut level = Level::new(LevelSource::Draft(5), W, H, LevelMode::Edit { playtesting: false });
        level.take_requests();
        level.complete_request(RequestKind::LoadData, Ok(serde_json::to_value(&data).unwrap()));
        level.drain_events();
        level
    }

    fn pointer_at(level: &Level, world_x: f32, world_y: f32, down: bool) -> InputState {
        InputState::default().with_pointer(world_x, level.height() - 1.0 - world_y, down)
    }

    #[test]
    fn test_new_server_level_queues_fetches() {
        let mut level = Level::new(LevelSource::Published(3), W, H, LevelMode::Play);
        assert!(level.is_loading());
        let kinds: Vec<_> = level.take_requests().into_iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![RequestKind::FetchIcon, RequestKind::LoadData]);

        level.complete_request(RequestKind::LoadData, Ok(serde_json::json!({})));
        assert!(!level.is_loading());
        assert!(level.player_object().is_some());
        let requests = level.take_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].request.path, "/api/levels/3/mark-as-played");

        // Reloading does not count a second play
        level.load_data(LevelData::default());
        assert!(level.take_requests().is_empty());
    }

    #[test]
    fn test_missing_level_enters_error_state() {
        let mut level = Level::new(LevelSource::Published(3), W, H, LevelMode::Play);
        level.complete_request(
            RequestKind::LoadData,
            Err(ApiError::Rejected {
                status: 404,
                reason: "nope".to_string(),
            }),
        );
        assert_eq!(level.error_message(), Some("Level not found"));
        assert!(level.objects().is_empty());
        // Ticks keep running without effect
        level.tick(1.0, &InputState::default());
        assert!(level.objects().is_empty());
    }

    #[test]
    fn test_load_replaces_arena_and_ids() {
        let mut level = local_play(LevelData::test_level());
        let old_player = level.player_object().unwrap().id;
        level.load_data(LevelData::test_level());
        assert!(level.object(old_player).is_none());
        assert_eq!(
            level.objects().len(),
            LevelData::test_level().objects.len() + 2
        );
    }

    #[test]
    fn test_icon_resolves_onto_player() {
        let mut level = local_play(LevelData::default());
        assert!(level.player().unwrap().icon.is_pending());
        level.complete_request(RequestKind::FetchIcon, Ok(serde_json::json!("ball")));
        assert_eq!(level.player().unwrap().icon, Cosmetic::Resolved(Icon::Ball));
        // Survives a reload
        level.load_data(LevelData::default());
        assert_eq!(level.player().unwrap().icon, Cosmetic::Resolved(Icon::Ball));
    }

    #[test]
    fn test_death_spawns_burst_and_resets() {
        let mut data = LevelData::default();
        data.player_x = 96.0;
        data.player_y = 32.0;
        data.objects.push(LevelObject {
            x: 128.0,
            y: 32.0,
            ty: ObjectType::Spike,
        });
        let mut level = local_play(data);
        // Drop the player onto the spike
        level.objects[0].x = 128.0;
        level.objects[0].y = 48.0;
        level.tick(1.0, &InputState::default());

        let events = level.drain_events();
        assert_eq!(
            events.iter().filter(|e| **e == LevelEvent::PlayerDied).count(),
            1
        );
        let p = level.player_object().unwrap();
        assert_eq!((p.x, p.y), (96.0, 32.0));
        assert_eq!(
            level
                .objects()
                .iter()
                .filter(|o| o.object_type() == ObjectType::Particles)
                .count(),
            1
        );
    }

    #[test]
    fn test_particles_expire() {
        let mut level = local_play(LevelData::default());
        level.spawn_particles(Vec2::new(200.0, 200.0), 10, 5.0, [1.0; 4]);
        assert_eq!(level.objects().len(), 2);
        for _ in 0..10 {
            level.tick(1.0, &InputState::default());
        }
        assert_eq!(level.objects().len(), 1);
    }

    #[test]
    fn test_particles_setting_off() {
        let mut level = local_play(LevelData::default()).with_settings(Settings {
            particles: false,
            ..Default::default()
        });
        level.spawn_particles(Vec2::ZERO, 10, 5.0, [1.0; 4]);
        assert_eq!(level.objects().len(), 1);
    }

    #[test]
    fn test_editor_place_marks_dirty_and_saves() {
        let mut data = LevelData::default();
        data.player_x = 32.0;
        data.player_y = 32.0;
        let mut level = draft(data);
        assert!(level.can_leave());

        let input = pointer_at(&level, 100.0, 70.0, true);
        level.tick(1.0, &input);
        assert!(level.is_dirty());
        assert!(!level.can_leave());
        assert_eq!(level.drain_events(), vec![LevelEvent::DirtyChanged(true)]);

        assert!(level.save());
        let requests = level.take_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].request.path, "/api/levels/wip/5/update-data");
        let objects = &requests[0].request.params["objects"];
        assert_eq!(objects, &serde_json::json!([{"x": 96.0, "y": 64.0, "type": "block"}]));

        level.complete_request(requests[0].kind, Ok(serde_json::json!({})));
        assert!(!level.is_dirty());
    }

    #[test]
    fn test_failed_save_stays_dirty_and_alerts() {
        let mut level = draft(LevelData::default());
        level.tick(1.0, &pointer_at(&level, 300.0, 40.0, true));
        assert!(level.save());
        let kind = level.take_requests()[0].kind;
        level.complete_request(kind, Err(ApiError::Network("offline".to_string())));
        assert!(level.is_dirty());
        let alerts: Vec<_> = level
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                LevelEvent::Alert(message) => Some(message),
                _ => None,
            })
            .collect();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].contains("offline"));
    }

    #[test]
    fn test_edit_during_save_keeps_dirty() {
        let mut level = draft(LevelData::default());
        level.tick(1.0, &pointer_at(&level, 300.0, 40.0, true));
        level.save();
        let kind = level.take_requests()[0].kind;
        level.tick(1.0, &pointer_at(&level, 340.0, 40.0, true));
        level.complete_request(kind, Ok(Value::Null));
        assert!(level.is_dirty());
    }

    #[test]
    fn test_publish_waits_for_save() {
        let mut level = draft(LevelData::default());
        level.tick(1.0, &pointer_at(&level, 300.0, 40.0, true));
        assert!(level.publish());
        let requests = level.take_requests();
        assert_eq!(requests.len(), 1);
        assert!(matches!(requests[0].kind, RequestKind::SaveData { .. }));

        level.complete_request(requests[0].kind, Ok(Value::Null));
        let next = level.take_requests();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].kind, RequestKind::Action(WipAction::Publish));
        assert_eq!(next[0].request.path, "/api/levels/wip/5/publish");
    }

    #[test]
    fn test_edit_tool_moves_player_start() {
        let mut level = draft(LevelData::default());
        level.set_tool(Tool::Edit);
        // Player starts at (96, 64)
        level.tick(1.0, &pointer_at(&level, 100.0, 70.0, false));
        level.tick(1.0, &pointer_at(&level, 100.0, 70.0, true));
        level.tick(1.0, &pointer_at(&level, 200.0, 150.0, true));
        level.tick(1.0, &pointer_at(&level, 200.0, 150.0, false));
        assert_eq!(level.data().player_x, 192.0);
        assert_eq!(level.data().player_y, 128.0);
        assert!(level.is_dirty());
    }

    #[test]
    fn test_eraser_keeps_player_and_goal() {
        let mut level = draft(LevelData::default());
        level.set_tool(Tool::Eraser);
        level.tick(1.0, &pointer_at(&level, 100.0, 70.0, true));
        assert!(level.player_object().is_some());
        assert!(!level.is_dirty());
    }

    #[test]
    fn test_published_win_marks_cleared_once() {
        let mut level = Level::new(LevelSource::Published(3), W, H, LevelMode::Play);
        level.take_requests();
        level.complete_request(
            RequestKind::LoadData,
            Ok(serde_json::json!({"playerX": 96, "playerY": 32, "endX": 128, "endY": 32})),
        );
        let played = level.take_requests();
        assert_eq!(played.len(), 1);
        assert_eq!(played[0].kind, RequestKind::MarkPlayed);

        let right = InputState {
            right: true,
            ..Default::default()
        };
        for _ in 0..60 {
            level.tick(1.0, &right);
        }
        assert!(level.is_winning());
        level.win();

        let cleared = level.take_requests();
        assert_eq!(cleared.len(), 1);
        assert_eq!(cleared[0].kind, RequestKind::MarkCleared);
        assert_eq!(cleared[0].request.method, Method::Post);
        assert_eq!(cleared[0].request.path, "/api/levels/3/mark-as-cleared");
    }

    #[test]
    fn test_local_win_reports_nothing() {
        let mut data = LevelData::default();
        data.set_goal(128.0, 32.0);
        data.player_x = 96.0;
        data.player_y = 32.0;
        let mut level = local_play(data);
        level.win();
        assert!(level.is_winning());
        assert!(level.take_requests().is_empty());
    }

    #[test]
    fn test_player_start_shadows_block_underneath() {
        let mut data = LevelData::default();
        data.objects.push(LevelObject {
            x: 96.0,
            y: 64.0,
            ty: ObjectType::Block,
        });
        let mut level = Level::new(LevelSource::Local, W, H, LevelMode::Edit { playtesting: false });
        level.load_data(data);

        let hit = level.hit_test(Vec2::new(100.0, 70.0)).unwrap();
        assert_eq!(hit.object_type(), ObjectType::Player);

        level.set_tool(Tool::Eraser);
        level.tick(1.0, &pointer_at(&level, 100.0, 70.0, false));
        level.tick(1.0, &pointer_at(&level, 100.0, 70.0, true));
        level.tick(1.0, &pointer_at(&level, 100.0, 70.0, false));
        let blocks = level
            .objects()
            .iter()
            .filter(|o| o.object_type() == ObjectType::Block)
            .count();
        assert_eq!(blocks, 1);
        assert!(level.player_object().is_some());
        assert!(!level.is_dirty());
    }

    #[test]
    fn test_designing_freezes_player() {
        let mut level = draft(LevelData::default());
        level.tick(1.0, &InputState::default());
        let p = level.player_object().unwrap();
        assert_eq!((p.x, p.y), (96.0, 64.0));

        level.start_playtest();
        level.tick(1.0, &InputState::default());
        assert!(level.player_object().unwrap().y < 64.0);

        level.stop_playtest();
        let p = level.player_object().unwrap();
        assert_eq!((p.x, p.y), (96.0, 64.0));
    }

    #[test]
    fn test_playtest_win_returns_to_editor() {
        let mut data = LevelData::default();
        data.set_goal(128.0, 64.0);
        let mut level = draft(data);
        level.start_playtest();
        level.drain_events();
        // Player at (96, 64) touches the goal on its right
        level.tick(1.0, &InputState::default());
        assert_eq!(level.mode(), LevelMode::Edit { playtesting: false });
        assert!(!level.is_winning());
        assert!(level.drain_events().contains(&LevelEvent::PlaytestChanged(false)));
    }

    #[test]
    fn test_screen_to_world_flips_y() {
        let level = local_play(LevelData::default());
        assert_eq!(level.screen_to_world(10.0, 0.0), Vec2::new(10.0, H - 1.0));
        assert_eq!(level.screen_to_world(10.0, H - 1.0), Vec2::new(10.0, 0.0));
    }
}
