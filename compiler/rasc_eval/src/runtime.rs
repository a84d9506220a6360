//! Runtime instances.
//!
//! A [`Runtime`] holds everything one run of a compiled script mutates:
//! bound images and their transforms, the world, image-scope variable
//! values, the `con` stack and the random number generator. The compiled
//! script itself is shared and never touched.
//!
//! ```text
//! Unbound --set_world--> WorldSet --variables resolved--> Ready --run ends--> Done
//! ```
//! `evaluate_all` derives a world from the bound images when none is set.

mod interp;

use std::fmt;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rasc_ir::ImageRole;
use rasc_lower::ir::ImageIndex;
use rasc_lower::{CompiledScript, ExecModel};
use smallvec::SmallVec;

use crate::error::{RuntimeError, RuntimeResult};
use crate::image::{Image, WritableImage};
use crate::progress::{ProgressPolicy, ProgressTracker};
use crate::transform::CoordinateTransform;
use crate::world::{World, WorldBounds};

use self::interp::{Flow, Frame};

/// Lifecycle of a [`Runtime`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum RuntimeState {
    /// No world yet; no pixel may be evaluated.
    Unbound,
    /// World known, image-scope variables not resolved.
    WorldSet,
    Ready,
    /// The last `evaluate_all` reached the end of the world.
    Done,
}

struct Binding<I> {
    image: I,
    transform: CoordinateTransform,
    /// Follows the runtime's default transform.
    is_default: bool,
}

/// Per-run state of one compiled script.
pub struct Runtime {
    script: Arc<CompiledScript>,
    /// Indexed by [`ImageIndex`]; only source slots are ever filled.
    sources: Vec<Option<Binding<Arc<dyn Image>>>>,
    /// Indexed by [`ImageIndex`]; only destination slots are ever filled.
    dests: Vec<Option<Binding<Box<dyn WritableImage>>>>,
    world: Option<World>,
    default_transform: CoordinateTransform,
    /// Client overrides; `None` means use the default.
    injected: Vec<Option<f64>>,
    vars: Vec<f64>,
    state: RuntimeState,
    rng: SmallRng,
    progress: ProgressPolicy,
    con_stack: SmallVec<[i8; 8]>,
}

impl Runtime {
    pub fn new(script: Arc<CompiledScript>) -> Self {
        let images = script.image_params.len();
        let vars = script.image_vars.len();
        Runtime {
            sources: (0..images).map(|_| None).collect(),
            dests: (0..images).map(|_| None).collect(),
            world: None,
            default_transform: CoordinateTransform::Identity,
            injected: vec![None; vars],
            vars: vec![f64::NAN; vars],
            state: RuntimeState::Unbound,
            rng: SmallRng::from_entropy(),
            progress: ProgressPolicy::none(),
            con_stack: SmallVec::new(),
            script,
        }
    }

    pub fn script(&self) -> &Arc<CompiledScript> {
        &self.script
    }

    pub fn state(&self) -> RuntimeState {
        self.state
    }

    /// Reseed the generator behind `rand` and `randInt`.
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    pub fn set_progress(&mut self, progress: ProgressPolicy) {
        self.progress = progress;
    }

    // Images

    fn image_slot(&self, name: &str, role: ImageRole) -> RuntimeResult<usize> {
        let Some(index) = self.script.image_index(name) else {
            return Err(RuntimeError::UnknownImage {
                name: name.to_string(),
            });
        };
        if self.script.image_role(name) != Some(role) {
            return Err(RuntimeError::WrongRole {
                name: name.to_string(),
                expected: role,
            });
        }
        Ok(index.index())
    }

    /// Bind a source image using the default transform.
    pub fn bind_source(&mut self, name: &str, image: Arc<dyn Image>) -> RuntimeResult<()> {
        let slot = self.image_slot(name, ImageRole::Source)?;
        self.sources[slot] = Some(Binding {
            image,
            transform: self.default_transform,
            is_default: true,
        });
        Ok(())
    }

    pub fn bind_source_with(
        &mut self,
        name: &str,
        image: Arc<dyn Image>,
        transform: CoordinateTransform,
    ) -> RuntimeResult<()> {
        let slot = self.image_slot(name, ImageRole::Source)?;
        self.sources[slot] = Some(Binding {
            image,
            transform,
            is_default: false,
        });
        Ok(())
    }

    /// Bind a destination image using the default transform.
    pub fn bind_dest(&mut self, name: &str, image: Box<dyn WritableImage>) -> RuntimeResult<()> {
        let slot = self.image_slot(name, ImageRole::Dest)?;
        self.dests[slot] = Some(Binding {
            image,
            transform: self.default_transform,
            is_default: true,
        });
        Ok(())
    }

    pub fn bind_dest_with(
        &mut self,
        name: &str,
        image: Box<dyn WritableImage>,
        transform: CoordinateTransform,
    ) -> RuntimeResult<()> {
        let slot = self.image_slot(name, ImageRole::Dest)?;
        self.dests[slot] = Some(Binding {
            image,
            transform,
            is_default: false,
        });
        Ok(())
    }

    /// Give one bound image an explicit transform.
    pub fn set_image_transform(
        &mut self,
        name: &str,
        transform: CoordinateTransform,
    ) -> RuntimeResult<()> {
        let unbound = || RuntimeError::UnboundImage {
            name: name.to_string(),
        };
        let Some(index) = self.script.image_index(name) else {
            return Err(RuntimeError::UnknownImage {
                name: name.to_string(),
            });
        };
        let i = index.index();
        if let Some(binding) = self.sources[i].as_mut() {
            binding.transform = transform;
            binding.is_default = false;
        } else if let Some(binding) = self.dests[i].as_mut() {
            binding.transform = transform;
            binding.is_default = false;
        } else {
            return Err(unbound());
        }
        Ok(())
    }

    pub fn image_transform(&self, name: &str) -> Option<CoordinateTransform> {
        let i = self.script.image_index(name)?.index();
        self.sources[i]
            .as_ref()
            .map(|b| b.transform)
            .or_else(|| self.dests[i].as_ref().map(|b| b.transform))
    }

    pub fn default_transform(&self) -> CoordinateTransform {
        self.default_transform
    }

    /// Change the default transform. Images bound with the default follow
    /// the change; images bound with an explicit transform keep theirs.
    pub fn set_default_transform(&mut self, transform: CoordinateTransform) {
        self.default_transform = transform;
        for binding in self.sources.iter_mut().flatten() {
            if binding.is_default {
                binding.transform = transform;
            }
        }
        for binding in self.dests.iter_mut().flatten() {
            if binding.is_default {
                binding.transform = transform;
            }
        }
    }

    pub fn dest_image(&self, name: &str) -> Option<&dyn WritableImage> {
        let i = self.script.image_index(name)?.index();
        self.dests[i].as_ref().map(|b| b.image.as_ref())
    }

    /// Unbind and return every destination image, in parameter order.
    pub fn take_dest_images(&mut self) -> Vec<(String, Box<dyn WritableImage>)> {
        let script = &self.script;
        self.dests
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| {
                let binding = slot.take()?;
                Some((image_name(script, ImageIndex(i as u32)), binding.image))
            })
            .collect()
    }

    // World

    /// Set the processing area. An invalid world is rejected and the
    /// current one kept.
    pub fn set_world(&mut self, bounds: WorldBounds, x_step: f64, y_step: f64) -> RuntimeResult<()> {
        let world = World::new(bounds, x_step, y_step)?;
        self.world = Some(world);
        self.state = RuntimeState::WorldSet;
        Ok(())
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    /// Bounds of the first bound destination image, else of the first bound
    /// source image, at one world unit per step.
    fn default_world(&self) -> RuntimeResult<World> {
        let bounds = match self.dests.iter().flatten().next() {
            Some(binding) => image_world_bounds(binding.image.as_ref(), &binding.transform),
            None => match self.sources.iter().flatten().next() {
                Some(binding) => image_world_bounds(binding.image.as_ref(), &binding.transform),
                None => return Err(RuntimeError::NoWorld),
            },
        };
        World::unit_steps(bounds.ok_or(RuntimeError::NoWorld)?)
    }

    // Image-scope variables

    fn var_index(&self, name: &str) -> RuntimeResult<usize> {
        self.script
            .image_var(name)
            .map(|v| v.index())
            .ok_or_else(|| RuntimeError::UnknownVariable {
                name: name.to_string(),
            })
    }

    /// Override an image-scope variable; `None` goes back to its default.
    pub fn set_var(&mut self, name: &str, value: Option<f64>) -> RuntimeResult<()> {
        let i = self.var_index(name)?;
        self.injected[i] = value;
        if matches!(self.state, RuntimeState::Ready | RuntimeState::Done) {
            self.state = RuntimeState::WorldSet;
        }
        Ok(())
    }

    /// Current value: resolved if the runtime is ready, otherwise the
    /// override if there is one.
    pub fn var(&self, name: &str) -> Option<f64> {
        let i = self.script.image_var(name)?.index();
        match self.state {
            RuntimeState::Ready | RuntimeState::Done => Some(self.vars[i]),
            RuntimeState::Unbound | RuntimeState::WorldSet => self.injected[i],
        }
    }

    /// Give every image-scope variable its override or default, in
    /// declaration order. Defaults see the world origin as the current
    /// position.
    fn resolve_vars(&mut self) -> RuntimeResult<()> {
        let Some(world) = self.world else {
            return Err(RuntimeError::NoWorld);
        };
        let script = Arc::clone(&self.script);
        let mut frame = Frame::new(script.local_count);
        frame.reset(world.bounds().min_x, world.bounds().min_y);
        for (i, decl) in script.image_vars.iter().enumerate() {
            let value = match (self.injected[i], &decl.default) {
                (Some(value), _) => value,
                (None, Some(default)) => self.eval(&mut frame, default)?.scalar()?,
                (None, None) => {
                    return Err(RuntimeError::UnsetVariable {
                        name: decl.name.clone(),
                    })
                }
            };
            self.vars[i] = value;
        }
        self.state = RuntimeState::Ready;
        Ok(())
    }

    // Evaluation

    /// Evaluate one pixel at world position `(x, y)`.
    ///
    /// Returns the pixel value under the indirect model (NaN when the script
    /// returns nothing) and `None` under the direct model.
    pub fn evaluate(&mut self, x: f64, y: f64) -> RuntimeResult<Option<f64>> {
        match self.state {
            RuntimeState::Unbound => return Err(RuntimeError::NoWorld),
            RuntimeState::WorldSet => self.resolve_vars()?,
            RuntimeState::Ready | RuntimeState::Done => {}
        }
        let script = Arc::clone(&self.script);
        let mut frame = Frame::new(script.local_count);
        self.eval_pixel(&script, &mut frame, x, y)
    }

    /// Evaluate every pixel of the world.
    ///
    /// Under the indirect model each returned value is stored into the
    /// script's destination image.
    #[tracing::instrument(level = "debug", skip_all, fields(model = %self.script.model))]
    pub fn evaluate_all(&mut self) -> RuntimeResult<()> {
        match self.script.model {
            ExecModel::Direct => self.run(|_, _, _, _| Ok(())),
            ExecModel::Indirect => {
                let dest = self
                    .script
                    .image_params
                    .iter()
                    .position(|(_, role)| role == ImageRole::Dest)
                    .map(|i| ImageIndex(i as u32));
                self.run(|runtime, x, y, value| match dest {
                    Some(dest) => runtime.write_dest(dest, x, y, value),
                    None => Ok(()),
                })
            }
        }
    }

    /// Evaluate every pixel of the world, handing each indirect-model result
    /// to `sink` as `(x, y, value)` instead of storing it.
    pub fn evaluate_all_with(&mut self, mut sink: impl FnMut(f64, f64, f64)) -> RuntimeResult<()> {
        self.run(|_, x, y, value| {
            sink(x, y, value);
            Ok(())
        })
    }

    fn run(
        &mut self,
        on_value: impl FnMut(&mut Self, f64, f64, f64) -> RuntimeResult<()>,
    ) -> RuntimeResult<()> {
        let world = match self.world {
            Some(world) => world,
            None => {
                let world = self.default_world()?;
                tracing::debug!(?world, "world derived from bound images");
                self.world = Some(world);
                world
            }
        };
        self.resolve_vars()?;

        let total = world.pixel_count();
        let mut progress = std::mem::take(&mut self.progress);
        let mut tracker = ProgressTracker::start(&mut progress, total);
        let result = self.run_pixels(&world, &mut tracker, on_value);
        if result.is_ok() {
            tracker.finish();
        }
        self.progress = progress;
        result?;

        self.state = RuntimeState::Done;
        tracing::debug!(pixels = total, "evaluation complete");
        Ok(())
    }

    fn run_pixels(
        &mut self,
        world: &World,
        tracker: &mut ProgressTracker<'_>,
        mut on_value: impl FnMut(&mut Self, f64, f64, f64) -> RuntimeResult<()>,
    ) -> RuntimeResult<()> {
        let script = Arc::clone(&self.script);
        let mut frame = Frame::new(script.local_count);
        let columns = world.columns();
        for row in 0..world.rows() {
            let y = world.y_at(row);
            for column in 0..columns {
                let x = world.x_at(column);
                if let Some(value) = self.eval_pixel(&script, &mut frame, x, y)? {
                    on_value(self, x, y, value)?;
                }
                tracker.tick();
            }
        }
        Ok(())
    }

    fn eval_pixel(
        &mut self,
        script: &CompiledScript,
        frame: &mut Frame,
        x: f64,
        y: f64,
    ) -> RuntimeResult<Option<f64>> {
        frame.reset(x, y);
        self.con_stack.clear();
        let flow = self.exec_block(frame, &script.body)?;
        Ok(match script.model {
            ExecModel::Direct => None,
            ExecModel::Indirect => Some(match flow {
                Flow::Return(value) => value,
                Flow::Normal | Flow::Break => f64::NAN,
            }),
        })
    }

    /// Store into a destination image; positions outside it, or null, are
    /// skipped.
    fn write_dest(&mut self, image: ImageIndex, x: f64, y: f64, value: f64) -> RuntimeResult<()> {
        let Some(binding) = self.dests.get_mut(image.index()).and_then(Option::as_mut) else {
            return Err(RuntimeError::UnboundImage {
                name: image_name(&self.script, image),
            });
        };
        let pixel = binding.transform.world_to_pixel(x, y);
        if let Some((px, py)) = pixel.filter(|&(px, py)| binding.image.contains(px, py)) {
            binding.image.set(px, py, 0, value);
        }
        Ok(())
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("model", &self.script.model)
            .field("state", &self.state)
            .field("world", &self.world)
            .field("default_transform", &self.default_transform)
            .finish_non_exhaustive()
    }
}

fn image_name(script: &CompiledScript, image: ImageIndex) -> String {
    script.image_name(image).unwrap_or("?").to_string()
}

/// World rectangle covered by an image's pixels.
fn image_world_bounds<I: Image + ?Sized>(
    image: &I,
    transform: &CoordinateTransform,
) -> Option<WorldBounds> {
    let x0 = image.min_x() as f64;
    let y0 = image.min_y() as f64;
    let x1 = x0 + f64::from(image.width());
    let y1 = y0 + f64::from(image.height());
    let corners = [(x0, y0), (x1, y0), (x0, y1), (x1, y1)]
        .iter()
        .map(|&(x, y)| transform.pixel_to_world(x, y))
        .collect::<Option<Vec<_>>>()?;
    WorldBounds::enclosing(&corners)
}
