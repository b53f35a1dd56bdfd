//! Camera, microphone and audio routing while a call screen is up.

use super::{ActionProcessor, Processor, base};
use crate::engine::{CallEngine, EngineResult};
use crate::event::CallEvent;
use crate::state::ServiceState;
use crate::types::{AudioDevice, CameraDirection, CameraState, GroupCallHandle, PhoneState};
use log::{info, warn};

pub(super) fn handle(p: &Processor<'_>, state: ServiceState, event: CallEvent) -> ServiceState {
    match event {
        CallEvent::SetEnableVideo { enable } => set_enable_video(p, state, enable),
        CallEvent::SetMuteAudio { muted } => set_mute_audio(p, state, muted),
        CallEvent::SetCameraFlip => set_camera_flip(p, state),
        CallEvent::CameraSwitchCompleted { camera_state } => {
            info!(target: p.tag, "handle_camera_switch_completed(): {camera_state:?}");
            with_camera(state, camera_state)
        }
        CallEvent::AudioDeviceChanged {
            active_device,
            available_devices,
        } => audio_device_changed(p, state, active_device, available_devices),
        CallEvent::SetUserAudioDevice { device } => {
            info!(target: p.tag, "handle_set_user_audio_device(): {device:?}");
            p.interactor.set_user_audio_device(device);
            state
        }
        other => base::handle(p, state, other),
    }
}

fn with_camera(mut state: ServiceState, camera_state: CameraState) -> ServiceState {
    state.local_device.camera_state = camera_state;
    if state.video.is_initialized() {
        state.video.camera = Some(camera_state);
    }
    state
}

fn set_enable_video(p: &Processor<'_>, state: ServiceState, enable: bool) -> ServiceState {
    info!(target: p.tag, "handle_set_enable_video(): enable: {enable}");

    let current = state.local_device.camera_state;
    let camera_state = if enable {
        let direction = match current.active_direction {
            CameraDirection::None => CameraDirection::Front,
            direction => direction,
        };
        CameraState::new(direction, current.camera_count.max(1))
    } else {
        CameraState::new(CameraDirection::None, current.camera_count)
    };
    let state = with_camera(state, camera_state);

    match p.phase {
        ActionProcessor::Connected => {
            p.interactor.update_phone_state(if enable {
                PhoneState::InVideo
            } else {
                PhoneState::InCall
            });
            match p.engine().set_video_enabled(enable) {
                Ok(()) => state,
                Err(e) => p.call_failure(state, "set_video_enabled() failed", &e),
            }
        }
        ActionProcessor::Outgoing => state.with_call_setup(|setup| setup.accept_with_video = enable),
        phase if phase.is_group() => {
            apply_to_group_call(p, &state, "set_group_outgoing_video_muted", |engine, call| {
                engine.set_group_outgoing_video_muted(call, !enable)
            });
            state
        }
        _ => state,
    }
}

fn set_mute_audio(p: &Processor<'_>, state: ServiceState, muted: bool) -> ServiceState {
    info!(target: p.tag, "handle_set_mute_audio(): muted: {muted}");

    let state = state.with_local_device(|device| device.microphone_enabled = !muted);

    match p.phase {
        ActionProcessor::Connected | ActionProcessor::Outgoing => {
            match p.engine().set_audio_enabled(!muted) {
                Ok(()) => state,
                Err(e) => p.call_failure(state, "set_audio_enabled() failed", &e),
            }
        }
        phase if phase.is_group() => {
            apply_to_group_call(p, &state, "set_group_outgoing_audio_muted", |engine, call| {
                engine.set_group_outgoing_audio_muted(call, muted)
            });
            state
        }
        _ => state,
    }
}

fn set_camera_flip(p: &Processor<'_>, state: ServiceState) -> ServiceState {
    let camera = state.local_device.camera_state;
    if !camera.is_enabled() || camera.camera_count < 2 {
        info!(target: p.tag, "handle_set_camera_flip(): no camera to switch to");
        return state;
    }

    let direction = match camera.active_direction {
        CameraDirection::Front => CameraDirection::Back,
        _ => CameraDirection::Front,
    };
    info!(target: p.tag, "handle_set_camera_flip(): {direction:?}");
    with_camera(state, CameraState::new(direction, camera.camera_count))
}

fn audio_device_changed(
    p: &Processor<'_>,
    state: ServiceState,
    active_device: AudioDevice,
    available_devices: Vec<AudioDevice>,
) -> ServiceState {
    info!(
        target: p.tag,
        "handle_audio_device_changed(): active: {active_device:?} available: {available_devices:?}"
    );

    state.with_local_device(|device| {
        device.active_audio_device = active_device;
        device.available_audio_devices = available_devices;
    })
}

/// Group media toggles are best effort: the engine reports a broken group call separately.
fn apply_to_group_call(
    p: &Processor<'_>,
    state: &ServiceState,
    operation: &str,
    apply: impl FnOnce(&dyn CallEngine, GroupCallHandle) -> EngineResult,
) {
    let Some(group_call) = state.call_info.group_call else {
        return;
    };
    if let Err(e) = apply(p.engine(), group_call) {
        warn!(target: p.tag, "{operation}() failed: {e}");
    }
}
