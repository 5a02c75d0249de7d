use std::sync::{Arc, Mutex, MutexGuard};

use notes_core::{is_watch_page, ControlModel, Msg};
use notes_engine::{parse_completion, InboundMessage};
use notes_logging::{notes_debug, notes_info};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::effects::{ControlContext, ControlDriver};
use super::page::{ContainerId, Page};

/// Why a mutation calls for another injection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The location changed; the previous control was removed.
    Navigated,
    /// The page still qualifies but its control is gone.
    SelfHeal,
}

/// Scope of the current navigation cycle.
struct Navigation {
    generation: u64,
    scope: CancellationToken,
    /// An injection attempt of this generation is in flight.
    injecting: bool,
    last_location: String,
}

/// Keeps exactly one notes control on a qualifying page.
pub struct Injector {
    context: ControlContext,
    navigation: Mutex<Navigation>,
    control_tx: watch::Sender<Option<Arc<ControlDriver>>>,
}

/// Releases the busy flag of the generation that took it.
struct AttemptGuard<'a> {
    injector: &'a Injector,
    generation: u64,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        let mut navigation = self.injector.lock_navigation();
        if navigation.generation == self.generation {
            navigation.injecting = false;
        }
    }
}

impl Injector {
    pub fn new(context: ControlContext) -> Arc<Self> {
        let last_location = context.page.location();
        let (control_tx, _) = watch::channel(None);
        Arc::new(Self {
            context,
            navigation: Mutex::new(Navigation {
                generation: 0,
                scope: CancellationToken::new(),
                injecting: false,
                last_location,
            }),
            control_tx,
        })
    }

    pub fn context(&self) -> &ControlContext {
        &self.context
    }

    /// Driver of the control currently in the page, if any.
    pub fn control(&self) -> Option<Arc<ControlDriver>> {
        self.control_tx.borrow().clone()
    }

    pub fn subscribe_control(&self) -> watch::Receiver<Option<Arc<ControlDriver>>> {
        self.control_tx.subscribe()
    }

    /// Inserts the control if the page qualifies and has none yet.
    ///
    /// Returns `true` when this call inserted it. Waits for the host
    /// container until it appears or the navigation moves on.
    pub async fn ensure_injected(&self) -> bool {
        let page = self.context.page.as_ref();
        if !is_watch_page(&page.location()) || page.has_control() {
            return false;
        }
        let Some((_guard, scope)) = self.begin_attempt() else {
            notes_debug!("Injection already in flight");
            return false;
        };

        let Some(container) = wait_for_container(page, &scope).await else {
            return false;
        };
        if page.has_control() || page.is_marked(container) {
            return false;
        }

        let identity = tokio::select! {
            _ = scope.cancelled() => return false,
            identity = self.context.auth.current_identity() => identity,
        };

        // Navigation may not interleave with the final checks and the insert.
        let navigation = self.lock_navigation();
        if scope.is_cancelled()
            || page.find_container() != Some(container)
            || page.has_control()
            || page.is_marked(container)
        {
            return false;
        }
        let mut model = ControlModel::new(identity.map(|identity| identity.user));
        let control_id = page.insert_control(container, &model.view());
        page.mark(container);
        model.consume_dirty();
        let driver = ControlDriver::new(
            self.context.clone(),
            control_id,
            model,
            navigation.scope.child_token(),
        );
        notes_info!(
            "Injected control {} into container {} ({:?})",
            control_id,
            container,
            driver.state()
        );
        if let Some(previous) = self.control_tx.send_replace(Some(driver)) {
            previous.shutdown();
        }
        true
    }

    /// Decides whether the latest page mutation calls for an injection attempt.
    ///
    /// A new location starts a new navigation cycle: pending work of the old
    /// one is cancelled and its control removed. Reports `Navigated` exactly
    /// once per distinct location.
    pub fn on_mutation(&self) -> Option<Trigger> {
        let page = self.context.page.as_ref();
        let location = page.location();
        {
            let mut navigation = self.lock_navigation();
            if navigation.last_location != location {
                notes_info!("Navigated to {}", location);
                navigation.last_location = location;
                self.begin_navigation(&mut navigation);
                return Some(Trigger::Navigated);
            }
        }
        if is_watch_page(&location) && !page.has_control() {
            return Some(Trigger::SelfHeal);
        }
        None
    }

    /// Handles one cross-context message. Returns `true` when it was a valid
    /// login completion.
    pub fn handle_message(&self, message: &InboundMessage) -> bool {
        let origin = self.context.auth.service_origin();
        let Some(completion) = parse_completion(message, &origin) else {
            return false;
        };
        notes_info!("Login completed");
        match self.control().filter(|driver| !driver.is_shut_down()) {
            Some(driver) => driver.dispatch(Msg::AuthCompleted {
                credential: completion.credential,
            }),
            None => self.context.auth.accept_completion(&completion),
        }
        true
    }

    /// Drives injection until `shutdown` fires: an initial attempt, then one
    /// per qualifying mutation, while forwarding inbound messages.
    pub async fn run(
        self: Arc<Self>,
        mut messages: mpsc::UnboundedReceiver<InboundMessage>,
        shutdown: CancellationToken,
    ) {
        let mut mutations = self.context.page.subscribe();
        self.spawn_ensure();
        let mut messages_open = true;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = mutations.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if let Some(trigger) = self.on_mutation() {
                        notes_debug!("Injection trigger {:?}", trigger);
                        self.spawn_ensure();
                    }
                }
                message = messages.recv(), if messages_open => match message {
                    Some(message) => {
                        self.handle_message(&message);
                    }
                    None => messages_open = false,
                },
            }
        }

        self.lock_navigation().scope.cancel();
        if let Some(driver) = self.control_tx.send_replace(None) {
            driver.shutdown();
        }
        notes_info!("Injector stopped");
    }

    fn spawn_ensure(self: &Arc<Self>) {
        let injector = Arc::clone(self);
        tokio::spawn(async move {
            injector.ensure_injected().await;
        });
    }

    fn begin_attempt(&self) -> Option<(AttemptGuard<'_>, CancellationToken)> {
        let mut navigation = self.lock_navigation();
        if navigation.injecting {
            return None;
        }
        navigation.injecting = true;
        let guard = AttemptGuard {
            injector: self,
            generation: navigation.generation,
        };
        Some((guard, navigation.scope.clone()))
    }

    fn begin_navigation(&self, navigation: &mut Navigation) {
        navigation.scope.cancel();
        navigation.scope = CancellationToken::new();
        navigation.generation += 1;
        navigation.injecting = false;

        if let Some(driver) = self.control_tx.send_replace(None) {
            driver.shutdown();
            self.context.page.remove_control(driver.control_id());
            notes_debug!("Removed stale control {}", driver.control_id());
        }
    }

    fn lock_navigation(&self) -> MutexGuard<'_, Navigation> {
        self.navigation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Resolves the first time the host container is present.
async fn wait_for_container(page: &dyn Page, scope: &CancellationToken) -> Option<ContainerId> {
    let mut mutations = page.subscribe();
    loop {
        if let Some(container) = page.find_container() {
            return Some(container);
        }
        tokio::select! {
            _ = scope.cancelled() => return None,
            changed = mutations.changed() => {
                if changed.is_err() {
                    return None;
                }
            }
        }
    }
}
