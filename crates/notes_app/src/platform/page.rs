use std::sync::Mutex;

use notes_core::ControlView;
use tokio::sync::watch;

pub type ContainerId = u64;
pub type ControlId = u64;

/// The host document, as far as the notes control is concerned.
///
/// Every change to the document, including the control's own insertion and
/// re-rendering, bumps the mutation counter returned by [`Page::subscribe`].
pub trait Page: Send + Sync {
    /// Full current location (href).
    fn location(&self) -> String;
    /// The container the control belongs in, once the host has rendered it.
    fn find_container(&self) -> Option<ContainerId>;
    /// True when a control (button or download link) is in the document.
    fn has_control(&self) -> bool;
    /// True when `container` already received a control.
    fn is_marked(&self, container: ContainerId) -> bool;
    fn mark(&self, container: ContainerId);
    /// Inserts the control as the first child of `container`.
    fn insert_control(&self, container: ContainerId, view: &ControlView) -> ControlId;
    /// Re-renders `control`; no-op when it is no longer in the document.
    fn render_control(&self, control: ControlId, view: &ControlView);
    /// Removes `control` and clears the marker of its container.
    fn remove_control(&self, control: ControlId);
    fn subscribe(&self) -> watch::Receiver<u64>;
}

/// Child of the container in a [`VirtualPage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Control { id: ControlId, view: ControlView },
    /// Something the host page rendered.
    Host(String),
}

#[derive(Debug)]
struct Container {
    id: ContainerId,
    marked: bool,
    children: Vec<Node>,
}

#[derive(Debug)]
struct Document {
    location: String,
    container: Option<Container>,
    next_id: u64,
}

/// In-memory document used by the headless session and by tests.
///
/// Models a single-page app: navigation only changes the location, and the
/// host may render, re-render or drop the control container at any time.
pub struct VirtualPage {
    doc: Mutex<Document>,
    mutations: watch::Sender<u64>,
}

impl VirtualPage {
    pub fn new(location: impl Into<String>) -> Self {
        let (mutations, _) = watch::channel(0);
        Self {
            doc: Mutex::new(Document {
                location: location.into(),
                container: None,
                next_id: 1,
            }),
            mutations,
        }
    }

    /// Client-side navigation: the document stays, the location changes.
    pub fn navigate(&self, location: impl Into<String>) {
        self.with_doc(|doc| doc.location = location.into());
    }

    /// Host renders a fresh, unmarked container, replacing any previous one.
    pub fn mount_container(&self) -> ContainerId {
        self.with_doc(|doc| {
            let id = doc.allocate_id();
            doc.container = Some(Container {
                id,
                marked: false,
                children: vec![Node::Host("like".to_string()), Node::Host("share".to_string())],
            });
            id
        })
    }

    /// Host tears the container down, taking the control with it.
    pub fn unmount_container(&self) {
        self.with_doc(|doc| doc.container = None);
    }

    /// An unrelated mutation somewhere in the document.
    pub fn touch(&self) {
        self.with_doc(|_| ());
    }

    pub fn control_count(&self) -> usize {
        self.read_doc(|doc| {
            doc.container.as_ref().map_or(0, |container| {
                container
                    .children
                    .iter()
                    .filter(|node| matches!(node, Node::Control { .. }))
                    .count()
            })
        })
    }

    pub fn control_view(&self) -> Option<ControlView> {
        self.read_doc(|doc| {
            doc.container.as_ref()?.children.iter().find_map(|node| match node {
                Node::Control { view, .. } => Some(view.clone()),
                Node::Host(_) => None,
            })
        })
    }

    pub fn children(&self) -> Vec<Node> {
        self.read_doc(|doc| {
            doc.container
                .as_ref()
                .map(|container| container.children.clone())
                .unwrap_or_default()
        })
    }

    fn read_doc<T>(&self, f: impl FnOnce(&Document) -> T) -> T {
        let doc = self.doc.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&doc)
    }

    /// Applies a mutation, then notifies subscribers outside the lock.
    fn with_doc<T>(&self, f: impl FnOnce(&mut Document) -> T) -> T {
        let result = {
            let mut doc = self.doc.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            f(&mut doc)
        };
        self.mutations.send_modify(|generation| *generation += 1);
        result
    }
}

impl Document {
    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn container_mut(&mut self, id: ContainerId) -> Option<&mut Container> {
        self.container.as_mut().filter(|container| container.id == id)
    }
}

impl Page for VirtualPage {
    fn location(&self) -> String {
        self.read_doc(|doc| doc.location.clone())
    }

    fn find_container(&self) -> Option<ContainerId> {
        self.read_doc(|doc| doc.container.as_ref().map(|container| container.id))
    }

    fn has_control(&self) -> bool {
        self.control_count() > 0
    }

    fn is_marked(&self, container: ContainerId) -> bool {
        self.read_doc(|doc| {
            doc.container
                .as_ref()
                .is_some_and(|c| c.id == container && c.marked)
        })
    }

    fn mark(&self, container: ContainerId) {
        self.with_doc(|doc| {
            if let Some(container) = doc.container_mut(container) {
                container.marked = true;
            }
        });
    }

    fn insert_control(&self, container: ContainerId, view: &ControlView) -> ControlId {
        self.with_doc(|doc| {
            let id = doc.allocate_id();
            if let Some(container) = doc.container_mut(container) {
                container.children.insert(
                    0,
                    Node::Control {
                        id,
                        view: view.clone(),
                    },
                );
            }
            id
        })
    }

    fn render_control(&self, control: ControlId, view: &ControlView) {
        self.with_doc(|doc| {
            let Some(container) = doc.container.as_mut() else {
                return;
            };
            for node in &mut container.children {
                if let Node::Control { id, view: current } = node {
                    if *id == control {
                        *current = view.clone();
                    }
                }
            }
        });
    }

    fn remove_control(&self, control: ControlId) {
        self.with_doc(|doc| {
            let Some(container) = doc.container.as_mut() else {
                return;
            };
            let before = container.children.len();
            container
                .children
                .retain(|node| !matches!(node, Node::Control { id, .. } if *id == control));
            if container.children.len() != before {
                container.marked = false;
            }
        });
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.mutations.subscribe()
    }
}
