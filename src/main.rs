//! Blockhop entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{HtmlCanvasElement, HtmlInputElement, KeyboardEvent, MouseEvent};

    use blockhop::Settings;
    use blockhop::persistence::{ApiError, ApiRequest, parse_response};
    use blockhop::platform::{FpsCounter, FrameClock, RenderLoop, keys};
    use blockhop::renderer::{DrawContext, RenderState};
    use blockhop::sim::{
        Icon, InputState, Level, LevelData, LevelEvent, LevelMode, LevelSource, ObjectType, Tool,
    };

    /// Game instance holding all state
    struct Game {
        level: Level,
        render_state: Option<RenderState>,
        draw: DrawContext,
        input: InputState,
        clock: FrameClock,
        render_loop: RenderLoop,
        fps: FpsCounter,
        /// A request batch is in flight; the next one waits for it
        sending: bool,
    }

    impl Game {
        fn new(level: Level) -> Self {
            Self {
                level,
                render_state: None,
                draw: DrawContext::new(),
                input: InputState::default(),
                clock: FrameClock::new(),
                render_loop: RenderLoop::new(),
                fps: FpsCounter::default(),
                sending: false,
            }
        }

        /// Render the current frame
        fn render(&mut self) {
            self.draw.clear();
            self.level.render(&mut self.draw);
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(self.draw.vertices()) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update overlay elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            if let Some(el) = document.get_element_by_id("level-overlay") {
                let text: Vec<&str> = self
                    .draw
                    .text_runs()
                    .iter()
                    .map(|run| run.text.as_str())
                    .collect();
                if text.is_empty() {
                    let _ = el.set_attribute("class", "hidden");
                } else {
                    el.set_text_content(Some(&text.join("\n")));
                    let _ = el.set_attribute("class", "");
                }
            }

            if let Some(el) = document.query_selector("#hud-fps .hud-value").ok().flatten() {
                if self.level.settings().show_fps {
                    el.set_text_content(Some(&self.fps.fps().to_string()));
                }
            }
        }

        /// React to what the level reported this frame
        fn handle_events(&mut self) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let document = window.document();
            for event in self.level.drain_events() {
                match event {
                    LevelEvent::Alert(message) => {
                        let _ = window.alert_with_message(&message);
                    }
                    LevelEvent::DirtyChanged(dirty) => {
                        if let Some(btn) = document.as_ref().and_then(|d| d.get_element_by_id("save-btn")) {
                            let class = if dirty { "unsaved" } else { "" };
                            let _ = btn.set_attribute("class", class);
                        }
                    }
                    LevelEvent::PlaytestChanged(on) => {
                        if let Some(btn) =
                            document.as_ref().and_then(|d| d.get_element_by_id("playtest-btn"))
                        {
                            btn.set_text_content(Some(if on { "Stop" } else { "Playtest" }));
                        }
                    }
                    LevelEvent::ActionCompleted(action) => {
                        log::info!("Server finished {}", action.as_str());
                    }
                    _ => {}
                }
            }
        }
    }

    /// Read the CSRF token from the page head
    fn csrf_token() -> Option<String> {
        let document = web_sys::window()?.document()?;
        let meta = document
            .query_selector("meta[name~=csrf_token][content]")
            .ok()??;
        meta.get_attribute("content")
    }

    fn js_error(e: JsValue) -> ApiError {
        ApiError::Network(format!("{e:?}"))
    }

    /// Send one request and decode the reply
    async fn send(request: &ApiRequest, csrf: Option<&str>) -> Result<serde_json::Value, ApiError> {
        let window = web_sys::window().ok_or_else(|| ApiError::Network("no window".into()))?;

        let init = web_sys::RequestInit::new();
        init.set_method(request.method.as_str());
        init.set_credentials(web_sys::RequestCredentials::SameOrigin);
        let headers = web_sys::Headers::new().map_err(js_error)?;
        headers
            .set("Content-type", "application/json; charset=UTF-8")
            .map_err(js_error)?;
        init.set_headers(&headers);
        if let Some(body) = request.body(csrf) {
            init.set_body(&JsValue::from_str(&body));
        }

        let req = web_sys::Request::new_with_str_and_init(&request.url(csrf), &init)
            .map_err(js_error)?;
        let resp: web_sys::Response = JsFuture::from(window.fetch_with_request(&req))
            .await
            .map_err(js_error)?
            .dyn_into()
            .map_err(js_error)?;
        let text = JsFuture::from(resp.text().map_err(js_error)?)
            .await
            .map_err(js_error)?;
        parse_response(resp.status(), &text.as_string().unwrap_or_default())
    }

    /// Send everything the level queued, one request at a time and in order
    fn flush_requests(game: Rc<RefCell<Game>>) {
        let batch = {
            let mut g = game.borrow_mut();
            if g.sending {
                return;
            }
            let batch = g.level.take_requests();
            if batch.is_empty() {
                return;
            }
            g.sending = true;
            batch
        };

        wasm_bindgen_futures::spawn_local(async move {
            let csrf = csrf_token();
            for pending in batch {
                let result = send(&pending.request, csrf.as_deref()).await;
                if let Err(e) = &result {
                    log::warn!("{} {} failed: {e}", pending.request.method.as_str(), pending.request.path);
                }
                game.borrow_mut().level.complete_request(pending.kind, result);
            }
            game.borrow_mut().sending = false;
        });
    }

    /// Level to run, from the canvas's data attributes
    fn level_config(canvas: &HtmlCanvasElement) -> (LevelSource, LevelMode, bool) {
        let mode = match canvas.get_attribute("data-mode").as_deref() {
            Some("edit") => LevelMode::Edit { playtesting: false },
            _ => LevelMode::Play,
        };
        let id = canvas
            .get_attribute("data-level-id")
            .and_then(|s| s.parse::<u32>().ok());
        match (id, mode) {
            (Some(id), LevelMode::Edit { .. }) => (LevelSource::Draft(id), mode, false),
            (Some(id), LevelMode::Play) => (LevelSource::Published(id), mode, false),
            (None, _) => (LevelSource::Local, mode, true),
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Blockhop starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        // World units are CSS pixels; the backing store follows the DPR
        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width();
        let client_h = canvas.client_height();
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let (source, mode, test_level) = level_config(&canvas);
        let settings = Settings::load();
        let mut level = Level::new(source, client_w as f32, client_h as f32, mode)
            .with_settings(settings)
            .with_seed(js_sys::Date::now() as u64);
        if test_level {
            level.load_data(LevelData::test_level());
        }
        let game = Rc::new(RefCell::new(Game::new(level)));

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let world_size = (client_w as f32, client_h as f32);
        match RenderState::new(surface, &adapter, width, height, world_size).await {
            Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
            Err(e) => log::error!("Failed to create device: {e}"),
        }

        setup_input_handlers(&canvas, game.clone());
        setup_editor_controls(game.clone());
        setup_unload_guard(game.clone());

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        start_loop(game);
        log::info!("Blockhop running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");

        // Keyboard
        for (kind, pressed) in [("keydown", true), ("keyup", false)] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if keys::apply_key(&mut game.borrow_mut().input, &event.code(), pressed) {
                    event.prevent_default();
                }
            });
            let _ = window.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse move
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                keys::apply_pointer_move(&mut g.input, event.offset_x() as f32, event.offset_y() as f32);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse down on the canvas
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                if event.button() != 0 {
                    return;
                }
                let mut g = game.borrow_mut();
                keys::apply_pointer_button(
                    &mut g.input,
                    event.offset_x() as f32,
                    event.offset_y() as f32,
                    true,
                );
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse up anywhere ends a drag
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                if event.button() == 0 {
                    game.borrow_mut().input.mouse_down = false;
                }
            });
            let _ = window.add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                keys::release_all(&mut game.borrow_mut().input);
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn on_click(id: &str, game: Rc<RefCell<Game>>, action: impl Fn(&mut Game) + 'static) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Some(btn) = document.get_element_by_id(id) else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
            action(&mut game.borrow_mut());
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_editor_controls(game: Rc<RefCell<Game>>) {
        let tools = [
            ("tool-block", Tool::Place(ObjectType::Block)),
            ("tool-spike", Tool::Place(ObjectType::Spike)),
            ("tool-ground-spike", Tool::Place(ObjectType::GroundSpike)),
            ("tool-edit", Tool::Edit),
            ("tool-eraser", Tool::Eraser),
        ];
        for (id, tool) in tools {
            on_click(id, game.clone(), move |g| g.level.set_tool(tool));
        }

        on_click("playtest-btn", game.clone(), |g| g.level.toggle_playtest());
        on_click("save-btn", game.clone(), |g| {
            g.level.save();
        });
        on_click("publish-btn", game.clone(), |g| {
            g.level.publish();
        });
        on_click("unpublish-btn", game.clone(), |g| {
            g.level.unpublish();
        });
        on_click("icon-gradient", game.clone(), |g| g.level.choose_icon(Icon::Gradient));
        on_click("icon-ball", game.clone(), |g| g.level.choose_icon(Icon::Ball));

        // Snap-to-grid checkbox
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Some(toggle) = document
            .get_element_by_id("snap-toggle")
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        else {
            return;
        };
        toggle.set_checked(game.borrow().level.settings().snap_to_grid);
        let toggle_clone = toggle.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut g = game.borrow_mut();
            g.level.set_snap(toggle_clone.checked());
            g.level.settings().save();
        });
        let _ = toggle.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Block navigation while the editor has unsaved changes
    fn setup_unload_guard(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::BeforeUnloadEvent| {
            if !game.borrow().level.can_leave() {
                event.prevent_default();
                event.set_return_value("You have unsaved changes");
            }
        });
        let _ = window.add_event_listener_with_callback("beforeunload", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Take over the canvas, cancelling any loop already driving it
    fn start_loop(game: Rc<RefCell<Game>>) {
        let (generation, previous) = {
            let mut g = game.borrow_mut();
            g.clock.reset();
            g.render_loop.attach()
        };
        if let (Some(handle), Some(window)) = (previous, web_sys::window()) {
            let _ = window.cancel_animation_frame(handle);
        }
        request_animation_frame(game, generation);
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>, generation: u64) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let game_clone = game.clone();
        let closure = Closure::once(move |time: f64| {
            game_loop(game_clone, generation, time);
        });
        if let Ok(handle) = window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            game.borrow_mut().render_loop.scheduled(generation, handle);
        }
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, generation: u64, time: f64) {
        {
            let mut g = game.borrow_mut();
            if !g.render_loop.is_current(generation) {
                return;
            }
            g.render_loop.fired(generation);

            let delta = g.clock.delta(time);
            let input = g.input;
            g.level.tick(delta, &input);
            g.fps.record(time);
            g.render();
            g.update_hud();
            g.handle_events();
        }

        flush_requests(game.clone());
        request_animation_frame(game, generation);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Blockhop (native) starting...");
    log::info!("Native mode has no window - run with `trunk serve` for the web version");

    println!("\nRunning the test level headless...");
    run_headless_demo();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Hold right and jump through the built-in level for ten seconds
#[cfg(not(target_arch = "wasm32"))]
fn run_headless_demo() {
    use blockhop::Settings;
    use blockhop::renderer::DrawContext;
    use blockhop::sim::{InputState, Level, LevelData, LevelEvent, LevelMode, LevelSource};

    let mut level = Level::new(LevelSource::Local, 800.0, 480.0, LevelMode::Play)
        .with_settings(Settings::load())
        .with_seed(1);
    level.load_data(LevelData::test_level());

    let input = InputState {
        right: true,
        up: true,
        ..Default::default()
    };
    let mut deaths = 0;
    let mut ticks = 0;
    while ticks < 600 && !level.is_winning() {
        level.tick(1.0, &input);
        ticks += 1;
        for event in level.drain_events() {
            match event {
                LevelEvent::PlayerDied => deaths += 1,
                LevelEvent::Won => println!("Goal reached after {ticks} ticks"),
                _ => {}
            }
        }
    }

    let mut ctx = DrawContext::new();
    level.render(&mut ctx);
    if let Some(player) = level.player_object() {
        println!("Player at ({:.1}, {:.1})", player.x, player.y);
    }
    println!(
        "✓ {ticks} ticks, {deaths} deaths, {} objects, {} vertices",
        level.objects().len(),
        ctx.vertices().len()
    );
}
