use std::os::unix::process::CommandExt;

use iced::keyboard::{self, key::Named, Key};
use iced::{event, Color, Element, Event, Subscription, Task};
use iced_layershell::build_pattern::daemon;
use iced_layershell::settings::{LayerShellSettings, StartMode};
use iced_layershell::to_layer_message;

use crate::bus;
use crate::config::Config;
use crate::ipc;
use crate::loader::LoaderAssets;
use crate::overlay::{CloseOutcome, CloseTrigger, OverlayController, PointerActivity};
use crate::session::CommandSessionClient;
use crate::signals::Signal;
use crate::surface::overlay_settings;
use crate::theme::OverlayColors;
use crate::timer::{SystemClock, Timers};
use crate::view::IcedView;

type IcedId = iced_layershell::reexport::IcedId;

const TICK_MS: u64 = 50;

pub(crate) struct App {
    pub(crate) controller: OverlayController<IcedView, CommandSessionClient>,
    pub(crate) colors: OverlayColors,
    surface_id: Option<IcedId>,
    target_output: Option<String>,
}

#[to_layer_message(multi)]
#[derive(Debug, Clone)]
pub(crate) enum Message {
    Signal(Signal),
    ViewReady(LoaderAssets),
    PointerMoved,
    PointerReleased,
    EscapePressed,
    ReloadRequested,
    Tick,
    Quit,
}

pub(crate) fn run(config: Config) -> Result<(), iced_layershell::Error> {
    tracing::info!(
        "v{} ({}) starting in background mode",
        env!("SERVER_OVERLAY_VERSION"),
        env!("SERVER_OVERLAY_COMMIT")
    );

    let settings = LayerShellSettings {
        start_mode: StartMode::Background,
        ..Default::default()
    };

    daemon(move || App::new(&config), App::namespace, App::update, App::view)
        .style(App::style)
        .subscription(App::subscription)
        .layer_settings(settings)
        .run()
}

impl App {
    fn new(config: &Config) -> (Self, Task<Message>) {
        let target_output = std::env::var("SERVER_OVERLAY_SCREEN")
            .ok()
            .filter(|s| !s.is_empty());
        if let Some(ref name) = target_output {
            tracing::info!("target screen: {name} (from SERVER_OVERLAY_SCREEN)");
        }

        let view = IcedView::new(config.overlay.close_delay, config.overlay.icon_dir.clone());
        let mut controller = OverlayController::new(
            view,
            CommandSessionClient::new(&config.session),
            Timers::new(SystemClock),
            &config.overlay,
        );
        controller.attach(bus::global());

        let boot = Task::perform(async { LoaderAssets::load() }, Message::ViewReady);
        (
            Self {
                controller,
                colors: OverlayColors::default(),
                surface_id: None,
                target_output,
            },
            boot,
        )
    }

    fn namespace() -> String {
        String::from("server-overlay")
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Signal(signal) => self.controller.handle_signal(signal),
            Message::ViewReady(assets) => {
                self.controller.view_mut().set_assets(assets);
                self.controller.on_view_ready();
                tracing::debug!("view ready");
            }
            Message::PointerMoved | Message::PointerReleased => {
                if let Some(activity) = pointer_activity(&message) {
                    self.controller.on_pointer_activity(activity);
                }
            }
            Message::EscapePressed => {
                self.controller.request_close_by_user(CloseTrigger::Escape);
            }
            Message::ReloadRequested => {
                if self.controller.request_close_by_user(CloseTrigger::Reload) == CloseOutcome::Reload
                {
                    self.restart();
                }
            }
            Message::Tick => {
                self.controller.poll_timers();
                self.controller.view_mut().tick();
            }
            Message::Quit => {
                self.controller.detach(bus::global());
                let _ = std::fs::remove_file(ipc::socket_path());
                tracing::info!("quit");
                std::process::exit(0);
            }
            _ => {}
        }
        self.sync_surface()
    }

    /// Open or remove the layer surface to match the view.
    fn sync_surface(&mut self) -> Task<Message> {
        match (self.controller.view().wants_surface(), self.surface_id) {
            (true, None) => {
                let (id, task) =
                    Message::layershell_open(overlay_settings(self.target_output.as_deref()));
                self.surface_id = Some(id);
                tracing::debug!("surface {id} opened");
                task
            }
            (false, Some(id)) => {
                self.surface_id = None;
                tracing::debug!("surface {id} removed");
                Task::done(Message::RemoveWindow(id))
            }
            _ => Task::none(),
        }
    }

    /// Replace this process with a fresh copy of itself.
    fn restart(&mut self) {
        self.controller.detach(bus::global());
        let exe = match std::env::current_exe() {
            Ok(exe) => exe,
            Err(e) => {
                tracing::error!("reload: cannot locate executable: {e}");
                self.controller.attach(bus::global());
                return;
            }
        };
        tracing::info!("reload: re-executing {exe:?}");
        let err = std::process::Command::new(&exe)
            .args(std::env::args_os().skip(1))
            .exec();
        tracing::error!("reload: exec {exe:?} failed: {err}");
        self.controller.attach(bus::global());
    }

    fn view(&self, _window_id: IcedId) -> Element<'_, Message> {
        self.view_overlay()
    }

    fn subscription(state: &Self) -> Subscription<Message> {
        let mut subs = vec![
            Subscription::run(ipc::socket_listener),
            event::listen_with(keyboard_message),
        ];

        if let Some(id) = state.controller.subscription() {
            subs.push(Subscription::run_with(id, ipc::signal_stream));
        }

        if state.controller.has_pending_timers() || state.controller.view().is_animating() {
            subs.push(Subscription::run_with(TICK_MS, ipc::tick_stream));
        }

        Subscription::batch(subs)
    }

    fn style(&self, _theme: &iced::Theme) -> iced::theme::Style {
        iced::theme::Style {
            background_color: Color::TRANSPARENT,
            text_color: self.colors.text,
        }
    }
}

/// Every release counts as a possible outside click, wherever it lands.
fn pointer_activity(message: &Message) -> Option<PointerActivity> {
    match message {
        Message::PointerMoved => Some(PointerActivity::Move),
        Message::PointerReleased => Some(PointerActivity::Release),
        _ => None,
    }
}

fn keyboard_message(event: Event, _status: event::Status, _id: iced::window::Id) -> Option<Message> {
    let Event::Keyboard(keyboard::Event::KeyPressed { key, .. }) = event else {
        return None;
    };
    match key {
        Key::Named(Named::Escape) => Some(Message::EscapePressed),
        Key::Named(Named::F5) => Some(Message::ReloadRequested),
        _ => None,
    }
}
