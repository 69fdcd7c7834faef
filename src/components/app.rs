use std::sync::Arc;

use dioxus::prelude::*;
use anyhow::Context;
use futures_util::StreamExt;
use log::{error, info, warn};

use voice_dialer::audio::default_capture_source;
use voice_dialer::config::DialerConfig;
use voice_dialer::platform::SimulatedPlatform;
use voice_dialer::presentation::{CallControlState, DialInput};
use voice_dialer::{SessionCommand, SessionHandle, SessionSnapshot};

use super::{CallControls, CallStatus, DialPad, ErrorBanner, MicrophoneTest, TitleBanner};

fn start_session() -> anyhow::Result<SessionHandle> {
    let config = DialerConfig::from_env().unwrap_or_else(|e| {
        warn!("Invalid dialer configuration, using defaults: {}", e);
        DialerConfig::default()
    });
    info!("Using token endpoint {}", config.token_url);

    // Calls are answered by the in-process platform after a short delay
    let platform = SimulatedPlatform::auto_answer(config.answer_delay);
    SessionHandle::from_config(&config, Arc::new(platform), default_capture_source())
        .context("Failed to build token client")
}

pub fn App() -> Element {
    let snapshot = use_signal(SessionSnapshot::default);
    let mut dial = use_signal(DialInput::new);
    let mut dial_error = use_signal(|| None::<String>);

    // The coroutine owns the session handle; the UI only sends commands
    // and renders the snapshots it publishes.
    let session = use_coroutine({
        let mut snapshot = snapshot;

        move |mut rx: UnboundedReceiver<SessionCommand>| async move {
            let handle = match start_session() {
                Ok(handle) => handle,
                Err(e) => {
                    error!("Failed to start session: {:#}", e);
                    return;
                }
            };

            let mut updates = handle.subscribe();
            handle.send(SessionCommand::Initialize);

            loop {
                tokio::select! {
                    command = rx.next() => match command {
                        Some(command) => {
                            handle.send(command);
                        }
                        None => break,
                    },

                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let latest = updates.borrow_and_update().clone();
                        snapshot.set(latest);
                    }
                }
            }

            handle.shutdown().await;
        }
    });

    let on_key = move |key: char| {
        dial.write().push(key);
        dial_error.set(None);
    };

    let on_input = move |text: String| {
        dial.write().set(&text);
        dial_error.set(None);
    };

    let on_backspace = move |_| {
        dial.write().backspace();
        dial_error.set(None);
    };

    let on_make_call = move |_| {
        let destination = dial.read().validate().map(str::to_string);
        match destination {
            Ok(destination) => {
                info!("Calling {}", destination);
                dial_error.set(None);
                session.send(SessionCommand::MakeCall { destination });
            }
            Err(e) => dial_error.set(Some(e.to_string())),
        }
    };

    let on_mute_toggle = move |_| session.send(SessionCommand::ToggleMute);
    let on_end_call = move |_| session.send(SessionCommand::EndCall);
    let on_dismiss = move |_| session.send(SessionCommand::DismissError);
    let on_start_test = move |_| session.send(SessionCommand::StartMicrophoneTest);
    let on_stop_test = move |_| session.send(SessionCommand::StopMicrophoneTest);

    let current = snapshot.read().clone();
    let control_state = CallControlState::from_snapshot(&current.call);
    let dial_value = dial.read().as_str().to_string();

    rsx! {
        div {
            class: "font-sans h-screen bg-gray-50 m-0 p-0 flex flex-col",

            TitleBanner { identity: current.call.identity.clone() }

            div {
                class: "px-5 pb-6 flex-grow flex flex-col gap-4 max-w-md w-full mx-auto",

                ErrorBanner {
                    message: current.call.error_message(),
                    on_dismiss: on_dismiss
                }

                CallStatus { call: current.call.clone() }

                DialPad {
                    value: dial_value,
                    enabled: control_state.dial_pad_enabled,
                    validation_error: dial_error.read().clone(),
                    on_key: on_key,
                    on_input: on_input,
                    on_backspace: on_backspace
                }

                CallControls {
                    call: current.call.clone(),
                    on_make_call: on_make_call,
                    on_mute_toggle: on_mute_toggle,
                    on_end_call: on_end_call
                }

                MicrophoneTest {
                    microphone: current.microphone.clone(),
                    on_start: on_start_test,
                    on_stop: on_stop_test
                }
            }
        }
    }
}
