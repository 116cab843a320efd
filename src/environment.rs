use crate::builtins::Builtins;
use crate::value::Value;
use log::trace;
use std::collections::HashMap;

/// Index of a frame in the environment arena.
pub type FrameId = usize;

#[derive(Debug, Default)]
struct Frame {
    values: HashMap<String, Value>,
    parent: Option<FrameId>,
}

/// Lexical scopes as an arena of frames linked by parent index.
///
/// Frames are created on block entry and discarded on block exit, so the
/// arena behaves as a stack: popping a frame drops it and everything pushed
/// after it. The root frame (index 0) is never dropped.
#[derive(Debug)]
pub struct Environment {
    frames: Vec<Frame>,
}

impl Environment {
    pub const ROOT: FrameId = 0;

    /// An environment whose root frame holds the given built-ins.
    pub fn new(builtins: &Builtins) -> Self {
        let mut environment = Self::empty();
        for native in builtins.iter() {
            environment.define(Self::ROOT, native.name, Value::NativeFunction(native.clone()));
        }
        environment
    }

    pub fn empty() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    pub fn push_frame(&mut self, parent: FrameId) -> FrameId {
        let id = self.frames.len();
        self.frames.push(Frame {
            values: HashMap::new(),
            parent: Some(parent),
        });
        trace!("push frame {} (parent {})", id, parent);
        id
    }

    pub fn pop_frame(&mut self, frame: FrameId) {
        trace!("pop frame {}", frame);
        self.frames.truncate(frame.max(Self::ROOT + 1));
    }

    /// Always binds in `frame` itself, shadowing outer bindings.
    pub fn define(&mut self, frame: FrameId, name: &str, value: Value) {
        self.frames[frame].values.insert(name.to_string(), value);
    }

    /// Rebinds the nearest existing binding, or defines in `frame` when no
    /// frame in the chain owns the name.
    pub fn set(&mut self, frame: FrameId, name: &str, value: Value) {
        let owner = self.owner(frame, name).unwrap_or(frame);
        self.frames[owner].values.insert(name.to_string(), value);
    }

    pub fn get(&self, frame: FrameId, name: &str) -> Option<&Value> {
        self.owner(frame, name)
            .and_then(|owner| self.frames[owner].values.get(name))
    }

    pub fn is_defined_locally(&self, frame: FrameId, name: &str) -> bool {
        self.frames[frame].values.contains_key(name)
    }

    fn owner(&self, frame: FrameId, name: &str) -> Option<FrameId> {
        let mut current = Some(frame);
        while let Some(id) = current {
            let frame = &self.frames[id];
            if frame.values.contains_key(name) {
                return Some(id);
            }
            current = frame.parent;
        }
        None
    }
}
