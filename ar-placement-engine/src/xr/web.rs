//! WebXR backend for wasm32 builds.
//!
//! Every WebXR callback runs on the page's event loop. Callbacks only touch
//! the shared backend state and push onto [`PlatformMessages`]; the Bevy frame
//! loop picks both up on its next tick.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use bevy::prelude::*;
use constants::session::{CANVAS_SELECTOR, START_BUTTON_ID};
use js_sys::{Array, Object, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext, XrFrame, XrPose, XrReferenceSpace,
    XrReferenceSpaceType, XrRenderStateInit, XrRigidTransform, XrSession, XrSessionInit,
    XrSessionMode, XrSpace, XrWebGlLayer, window,
};

use super::error::ArError;
use super::platform::{
    ArFrame, ArPlatform, CancelToken, HitTestSourceId, PlatformEvent, PlatformMessages,
    SessionId, SessionMode, SessionRequest,
};
use super::pose::Pose;

// WebXR Hit Test Module. web-sys ships no bindings for it.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(extends = Object, js_name = XRHitTestSource)]
    #[derive(Debug, Clone)]
    type XrHitTestSource;

    #[wasm_bindgen(method)]
    fn cancel(this: &XrHitTestSource);

    #[wasm_bindgen(extends = Object, js_name = XRHitTestResult)]
    #[derive(Debug, Clone)]
    type XrHitTestResult;

    #[wasm_bindgen(method, js_name = getPose)]
    fn get_pose(this: &XrHitTestResult, base_space: &XrSpace) -> Option<XrPose>;

    #[wasm_bindgen(method, js_class = "XRSession", js_name = requestHitTestSource)]
    fn request_hit_test_source(this: &XrSession, options: &Object) -> Promise;

    #[wasm_bindgen(method, js_class = "XRFrame", js_name = getHitTestResults)]
    fn get_hit_test_results(this: &XrFrame, source: &XrHitTestSource) -> Array;
}

type FrameCallback = Closure<dyn FnMut(f64, XrFrame)>;
type FrameLoop = Rc<RefCell<Option<FrameCallback>>>;

/// JS callbacks registered on a session. They live exactly as long as the session.
struct SessionListeners {
    _select: Closure<dyn FnMut()>,
    _end: Closure<dyn FnMut()>,
    frame_loop: FrameLoop,
}

struct ActiveSession {
    id: SessionId,
    session: XrSession,
    local_space: XrReferenceSpace,
    sources: Vec<(HitTestSourceId, XrHitTestSource)>,
    listeners: SessionListeners,
}

#[derive(Default)]
struct WebXrState {
    next_id: u64,
    active: Option<ActiveSession>,
    latest_frame: Option<ArFrame>,
}

impl WebXrState {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

type SharedState = Rc<RefCell<WebXrState>>;

pub struct WebXrPlatform {
    state: SharedState,
    _start_listener: Option<Closure<dyn FnMut()>>,
}

impl WebXrPlatform {
    /// Create the backend and bind the page's start button.
    pub fn new(messages: &PlatformMessages) -> Self {
        let state = SharedState::default();
        let start_listener = install_start_control(&state, messages);
        Self {
            state,
            _start_listener: start_listener,
        }
    }
}

impl ArPlatform for WebXrPlatform {
    fn name(&self) -> &'static str {
        "WebXR"
    }

    fn request_session(&mut self, request: &SessionRequest, messages: &PlatformMessages) {
        request_immersive_session(&self.state, request, messages);
    }

    fn request_hit_test_source(
        &mut self,
        session: SessionId,
        cancel: CancelToken,
        messages: &PlatformMessages,
    ) {
        let xr_session = match self.state.borrow().active.as_ref() {
            Some(active) if active.id == session => active.session.clone(),
            _ => {
                messages.push(PlatformEvent::HitTestFailed {
                    session,
                    error: ArError::HitTestSetup(format!("session {session} is not running")),
                });
                return;
            }
        };

        let state = self.state.clone();
        let messages = messages.clone();
        spawn_local(async move {
            match resolve_hit_test_source(&xr_session, &cancel).await {
                Ok(Some(source)) => {
                    let mut guard = state.borrow_mut();
                    let state = &mut *guard;
                    let id = HitTestSourceId(state.allocate_id());
                    match state.active.as_mut() {
                        Some(active) if active.id == session => {
                            active.sources.push((id, source));
                            messages.push(PlatformEvent::HitTestReady { session, source: id });
                        }
                        _ => source.cancel(),
                    }
                }
                Ok(None) => debug!("Hit-test setup for session {} cancelled", session),
                Err(err) => messages.push(PlatformEvent::HitTestFailed {
                    session,
                    error: ArError::HitTestSetup(describe_js(&err)),
                }),
            }
        });
    }

    fn poll_frame(&mut self) -> Option<ArFrame> {
        self.state.borrow_mut().latest_frame.take()
    }

    fn end_session(&mut self, session: SessionId, _messages: &PlatformMessages) {
        // The session's `end` listener confirms the shutdown.
        let state = self.state.borrow();
        if let Some(active) = state.active.as_ref().filter(|active| active.id == session) {
            let _ = active.session.end();
        }
    }
}

fn install_start_control(
    state: &SharedState,
    messages: &PlatformMessages,
) -> Option<Closure<dyn FnMut()>> {
    let document = window()?.document()?;
    let Some(button) = document.get_element_by_id(START_BUTTON_ID) else {
        warn!("No #{} element on the page, AR can only be started programmatically", START_BUTTON_ID);
        return None;
    };

    let state = state.clone();
    let click_messages = messages.clone();
    // The request must be issued inside the click handler to keep user activation.
    let listener = Closure::<dyn FnMut()>::new(move || {
        click_messages.push(PlatformEvent::SessionRequested);
        request_immersive_session(&state, &SessionRequest::immersive_ar(), &click_messages);
    });

    if let Err(err) =
        button.add_event_listener_with_callback("click", listener.as_ref().unchecked_ref())
    {
        error!("Failed to bind #{}: {}", START_BUTTON_ID, describe_js(&err));
        return None;
    }
    Some(listener)
}

fn request_immersive_session(
    state: &SharedState,
    request: &SessionRequest,
    messages: &PlatformMessages,
) {
    if state.borrow().active.is_some() {
        messages.push(PlatformEvent::SessionRejected(ArError::SessionUnavailable(
            "an AR session is already running".into(),
        )));
        return;
    }
    let Some(window) = window() else {
        messages.push(PlatformEvent::SessionRejected(ArError::SessionUnavailable(
            "no browser window".into(),
        )));
        return;
    };

    let init = XrSessionInit::new();
    let features: Array = request
        .required_features
        .iter()
        .map(|feature| JsValue::from_str(feature))
        .collect();
    init.set_required_features(&features);

    let promise = window
        .navigator()
        .xr()
        .request_session_with_options(xr_mode(request.mode), &init);

    let state = state.clone();
    let messages = messages.clone();
    spawn_local(async move {
        let session = JsFuture::from(promise)
            .await
            .and_then(|value| value.dyn_into::<XrSession>());
        match session {
            Ok(session) => start_session(&state, session, &messages).await,
            Err(err) => messages.push(PlatformEvent::SessionRejected(
                ArError::SessionUnavailable(describe_js(&err)),
            )),
        }
    });
}

fn xr_mode(mode: SessionMode) -> XrSessionMode {
    match mode {
        SessionMode::ImmersiveAr => XrSessionMode::ImmersiveAr,
    }
}

/// Finish bringing up a granted session. Any failure ends it and rejects the request.
async fn start_session(state: &SharedState, session: XrSession, messages: &PlatformMessages) {
    let local_space = match prepare_session(&session).await {
        Ok(space) => space,
        Err(error) => {
            let _ = session.end();
            messages.push(PlatformEvent::SessionRejected(error));
            return;
        }
    };

    let id = SessionId(state.borrow_mut().allocate_id());
    let listeners = install_session_listeners(state, &session, id, messages);
    let frame_loop = Rc::downgrade(&listeners.frame_loop);

    state.borrow_mut().active = Some(ActiveSession {
        id,
        session: session.clone(),
        local_space,
        sources: Vec::new(),
        listeners,
    });
    request_next_frame(&session, &frame_loop);
    messages.push(PlatformEvent::SessionGranted(id));
}

async fn prepare_session(session: &XrSession) -> Result<XrReferenceSpace, ArError> {
    attach_render_layer(session).await?;

    JsFuture::from(session.request_reference_space(XrReferenceSpaceType::Local))
        .await
        .and_then(|value| value.dyn_into::<XrReferenceSpace>())
        .map_err(|err| {
            ArError::SessionUnavailable(format!(
                "local reference space unavailable: {}",
                describe_js(&err)
            ))
        })
}

/// Give the session a WebGL layer on the engine canvas. Without a base layer
/// the browser never runs the session's animation frames.
async fn attach_render_layer(session: &XrSession) -> Result<(), ArError> {
    let context = window()
        .and_then(|window| window.document())
        .and_then(|document| document.query_selector(CANVAS_SELECTOR).ok().flatten())
        .and_then(|element| element.dyn_into::<HtmlCanvasElement>().ok())
        .and_then(|canvas| canvas.get_context("webgl2").ok().flatten())
        .and_then(|context| context.dyn_into::<WebGl2RenderingContext>().ok())
        .ok_or_else(|| {
            ArError::SessionUnavailable(format!("{CANVAS_SELECTOR} has no WebGL2 context"))
        })?;

    JsFuture::from(context.make_xr_compatible())
        .await
        .map_err(|err| {
            ArError::SessionUnavailable(format!(
                "WebGL context is not XR compatible: {}",
                describe_js(&err)
            ))
        })?;

    let layer = XrWebGlLayer::new_with_web_gl2_rendering_context(session, &context).map_err(
        |err| {
            ArError::SessionUnavailable(format!(
                "failed to create XR base layer: {}",
                describe_js(&err)
            ))
        },
    )?;
    let render_state = XrRenderStateInit::new();
    render_state.set_base_layer(Some(&layer));
    session.update_render_state_with_state(&render_state);
    Ok(())
}

async fn resolve_hit_test_source(
    session: &XrSession,
    cancel: &CancelToken,
) -> Result<Option<XrHitTestSource>, JsValue> {
    let viewer_space: XrReferenceSpace =
        JsFuture::from(session.request_reference_space(XrReferenceSpaceType::Viewer))
            .await?
            .dyn_into()?;
    if cancel.is_cancelled() {
        return Ok(None);
    }

    let options = hit_test_options(&viewer_space)?;
    let source: XrHitTestSource = JsFuture::from(session.request_hit_test_source(&options))
        .await?
        .dyn_into()?;
    if cancel.is_cancelled() {
        source.cancel();
        return Ok(None);
    }
    Ok(Some(source))
}

/// `XRHitTestOptionsInit` casting rays along the forward axis of `space`.
fn hit_test_options(space: &XrSpace) -> Result<Object, JsValue> {
    let options = Object::new();
    Reflect::set(&options, &JsValue::from_str("space"), space)?;
    Ok(options)
}

fn install_session_listeners(
    state: &SharedState,
    session: &XrSession,
    id: SessionId,
    messages: &PlatformMessages,
) -> SessionListeners {
    let select_messages = messages.clone();
    let on_select =
        Closure::<dyn FnMut()>::new(move || select_messages.push(PlatformEvent::Select));
    session.set_onselect(Some(on_select.as_ref().unchecked_ref()));

    let end_state = state.clone();
    let end_messages = messages.clone();
    let on_end = Closure::<dyn FnMut()>::new(move || {
        let finished = finish_session(&end_state, id, &end_messages);
        // This handler is one of the listeners being released.
        if let Some(finished) = finished {
            spawn_local(async move { drop(finished) });
        }
    });
    session.set_onend(Some(on_end.as_ref().unchecked_ref()));

    SessionListeners {
        _select: on_select,
        _end: on_end,
        frame_loop: frame_loop(state),
    }
}

/// Detach session `id` from the backend and report its end.
fn finish_session(
    state: &SharedState,
    id: SessionId,
    messages: &PlatformMessages,
) -> Option<ActiveSession> {
    let finished = {
        let mut state = state.borrow_mut();
        if state.active.as_ref().is_some_and(|active| active.id == id) {
            state.latest_frame = None;
            state.active.take()
        } else {
            None
        }
    };
    messages.push(PlatformEvent::SessionEnded(id));
    finished
}

/// Build the session's animation-frame callback. The callback only holds a
/// weak handle to itself; the session's listeners own it.
fn frame_loop(state: &SharedState) -> FrameLoop {
    let frame_loop: FrameLoop = Rc::new(RefCell::new(None));
    let next = Rc::downgrade(&frame_loop);
    let frame_state = state.clone();

    *frame_loop.borrow_mut() = Some(Closure::new(move |_time: f64, frame: XrFrame| {
        if record_frame(&frame_state, &frame) {
            request_next_frame(&frame.session(), &next);
        }
    }));
    frame_loop
}

fn request_next_frame(session: &XrSession, frame_loop: &Weak<RefCell<Option<FrameCallback>>>) {
    let Some(frame_loop) = frame_loop.upgrade() else {
        return;
    };
    if let Some(callback) = frame_loop.borrow().as_ref() {
        session.request_animation_frame(callback.as_ref().unchecked_ref());
    }
}

/// Returns `false` once the session has gone away.
fn record_frame(state: &SharedState, frame: &XrFrame) -> bool {
    let mut state = state.borrow_mut();
    let Some(active) = state.active.as_ref() else {
        return false;
    };

    let viewer = frame
        .get_viewer_pose(&active.local_space)
        .and_then(|pose| pose_from_transform(&pose.transform()));

    let mut sample = ArFrame::new(active.id, viewer);
    for (id, source) in &active.sources {
        let ranked: Vec<Pose> = frame
            .get_hit_test_results(source)
            .iter()
            .filter_map(|result| result.dyn_into::<XrHitTestResult>().ok())
            .filter_map(|result| result.get_pose(&active.local_space))
            .filter_map(|pose| pose_from_transform(&pose.transform()))
            .collect();
        sample = sample.with_hit_results(*id, ranked);
    }

    state.latest_frame = Some(sample);
    true
}

fn pose_from_transform(transform: &XrRigidTransform) -> Option<Pose> {
    Pose::from_cols_slice(&transform.matrix())
}

fn describe_js(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|error| String::from(error.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use js_sys::Function;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    /// Plain object standing in for an `XRSession`; `end()` sets `ended`.
    fn stand_in_session() -> XrSession {
        let session = Object::new();
        let end = Function::new_no_args("this.ended = true; return Promise.resolve();");
        Reflect::set(&session, &JsValue::from_str("end"), &end).unwrap();
        session.unchecked_into()
    }

    fn was_ended(session: &XrSession) -> bool {
        Reflect::get(session, &JsValue::from_str("ended"))
            .unwrap()
            .is_truthy()
    }

    fn active_session(state: &SharedState, id: SessionId, messages: &PlatformMessages) {
        let session = stand_in_session();
        let listeners = install_session_listeners(state, &session, id, messages);
        state.borrow_mut().active = Some(ActiveSession {
            id,
            session,
            local_space: Object::new().unchecked_into(),
            sources: Vec::new(),
            listeners,
        });
    }

    #[wasm_bindgen_test]
    fn hit_test_options_cast_from_the_given_space() {
        let space: XrSpace = Object::new().unchecked_into();

        let options = hit_test_options(&space).unwrap();

        let stored = Reflect::get(&options, &JsValue::from_str("space")).unwrap();
        assert!(JsValue::from(space).eq(&stored));
    }

    #[wasm_bindgen_test]
    async fn session_without_render_layer_is_ended_and_rejected() {
        // The test page has no engine canvas, so no base layer can be attached.
        let state = SharedState::default();
        let messages = PlatformMessages::default();
        let session = stand_in_session();

        start_session(&state, session.clone(), &messages).await;

        assert!(was_ended(&session));
        assert!(state.borrow().active.is_none());
        let events = messages.drain();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            PlatformEvent::SessionRejected(ArError::SessionUnavailable(_))
        ));
    }

    #[wasm_bindgen_test]
    fn finishing_a_session_releases_its_listeners() {
        let state = SharedState::default();
        let messages = PlatformMessages::default();
        active_session(&state, SessionId(4), &messages);
        let frame_loop = state
            .borrow()
            .active
            .as_ref()
            .map(|active| Rc::downgrade(&active.listeners.frame_loop))
            .unwrap();

        let finished = finish_session(&state, SessionId(4), &messages);
        assert!(state.borrow().active.is_none());
        drop(finished);

        assert!(frame_loop.upgrade().is_none());
        assert!(matches!(
            messages.drain().as_slice(),
            [PlatformEvent::SessionEnded(SessionId(4))]
        ));
    }

    #[wasm_bindgen_test]
    fn stale_end_leaves_the_running_session_alone() {
        let state = SharedState::default();
        let messages = PlatformMessages::default();
        active_session(&state, SessionId(5), &messages);

        assert!(finish_session(&state, SessionId(2), &messages).is_none());
        assert_eq!(
            state.borrow().active.as_ref().map(|active| active.id),
            Some(SessionId(5))
        );
    }
}
