use std::collections::HashMap;

use chrono::NaiveDateTime;
use rota_config::{AvailableDataDef, InputDef, TaskDef, TaskKind, WorkflowDef};
use rota_workflow::{
  Coordinates, DataId, DataInstance, Edge, InstanceKey, PortBinding, TaskId, TaskInstance,
  Workflow, WorkflowError, canonical_label,
};
use tracing::{debug, info, instrument, trace};

use crate::binding::{Binding, compile};
use crate::cycle::CycleSpec;
use crate::error::UnrollError;
use crate::parameters::expand;
use crate::probe::{LocalFs, PathKind, PathProbe, require};
use crate::template::{Placement, TargetKind, Templates};

/// Unroller turns a workflow template into a concrete instance graph.
pub trait Unroll {
  /// Unroll a workflow template.
  ///
  /// This process:
  /// 1. Validates the template graph (names, references, parameters)
  /// 2. Creates every task instance and its outputs, cycle by cycle
  /// 3. Binds inputs and `wait_on` entries to concrete instances
  /// 4. Checks the resulting task graph for cycles
  fn unroll(&self, def: &WorkflowDef) -> Result<Workflow, UnrollError>;
}

/// Standard unroller that checks declared local paths through a probe.
pub struct StandardUnroller<P: PathProbe> {
  probe: P,
}

impl<P: PathProbe> StandardUnroller<P> {
  /// Create a new unroller with the given path probe.
  pub fn new(probe: P) -> Self {
    Self { probe }
  }
}

impl<P: PathProbe> Unroll for StandardUnroller<P> {
  #[instrument(skip_all, fields(workflow = %def.name))]
  fn unroll(&self, def: &WorkflowDef) -> Result<Workflow, UnrollError> {
    info!(
      cycles = def.cycles.len(),
      tasks = def.tasks.len(),
      "unroll_started"
    );

    let workflow = Builder::new(def, &self.probe)?.run()?;

    info!(
      task_instances = workflow.tasks().len(),
      data_instances = workflow.data().len(),
      edges = workflow.edges().len(),
      "unroll_completed"
    );
    Ok(workflow)
  }
}

/// Unroll a workflow template, checking local paths on the local filesystem.
pub fn build(def: &WorkflowDef) -> Result<Workflow, UnrollError> {
  StandardUnroller::new(LocalFs).unroll(def)
}

struct CompiledCycle<'a> {
  name: &'a str,
  spec: Option<CycleSpec>,
  tasks: Vec<CompiledTask<'a>>,
}

/// A cycle task with its dependencies checked.
struct CompiledTask<'a> {
  placement: Placement<'a>,
  def: &'a TaskDef,
  inputs: Vec<(&'a InputDef, Binding<'a>)>,
  wait_on: Vec<Binding<'a>>,
}

struct Builder<'a, P> {
  def: &'a WorkflowDef,
  probe: &'a P,
  templates: Templates<'a>,
  tasks: Vec<TaskInstance>,
  data: Vec<DataInstance>,
  edges: Vec<Edge>,
  task_memo: HashMap<InstanceKey, TaskId>,
  data_memo: HashMap<InstanceKey, DataId>,
  /// Payloads with local paths resolved, per task template
  kinds: HashMap<&'a str, TaskKind>,
}

impl<'a, P: PathProbe> Builder<'a, P> {
  fn new(def: &'a WorkflowDef, probe: &'a P) -> Result<Self, UnrollError> {
    Ok(Self {
      def,
      probe,
      templates: Templates::index(def)?,
      tasks: Vec::new(),
      data: Vec::new(),
      edges: Vec::new(),
      task_memo: HashMap::new(),
      data_memo: HashMap::new(),
      kinds: HashMap::new(),
    })
  }

  fn run(mut self) -> Result<Workflow, UnrollError> {
    let cycles = self.compile()?;
    let def = self.def;
    let space = &def.parameters;

    // Pass 1: task instances and their outputs. `origins` maps each task
    // instance to the cycle task it came from.
    let mut origins: Vec<(usize, usize)> = Vec::new();
    for (cycle_index, cycle) in cycles.iter().enumerate() {
      let dates: Vec<Option<NaiveDateTime>> = match &cycle.spec {
        Some(spec) => spec.dates().map(Some).collect(),
        None => vec![None],
      };
      debug!(cycle = cycle.name, dates = dates.len(), "cycle_expanded");

      for date in dates {
        for (task_index, task) in cycle.tasks.iter().enumerate() {
          let product = expand(&task.def.name, &task.def.parameters, space)?;
          for mut coordinates in product {
            coordinates.set_date(date);
            self.add_task(task, coordinates)?;
            origins.push((cycle_index, task_index));
          }
        }
      }
    }

    // Pass 2: bind dependencies in creation order
    for (index, (cycle_index, task_index)) in origins.into_iter().enumerate() {
      self.bind(TaskId::new(index), &cycles[cycle_index].tasks[task_index])?;
    }

    let workflow = Workflow::from_parts(
      def.name.clone(),
      space.clone(),
      self.tasks,
      self.data,
      self.edges,
    )?;

    if let Some(id) = workflow.graph().find_cycle() {
      let label = workflow
        .task(id)
        .map_or_else(|| id.to_string(), |task| task.label.clone());
      return Err(UnrollError::CycleDetected { label });
    }
    Ok(workflow)
  }

  /// Parse cycling and check every dependency before anything is created.
  fn compile(&self) -> Result<Vec<CompiledCycle<'a>>, UnrollError> {
    let templates = &self.templates;
    let workflow: &'a WorkflowDef = self.def;
    let mut cycles = Vec::with_capacity(workflow.cycles.len());

    for cycle in &workflow.cycles {
      let spec = templates.cycling(&cycle.name);

      let mut tasks = Vec::with_capacity(cycle.tasks.len());
      for task in &cycle.tasks {
        let placement = Placement { cycle, task };
        let def = templates
          .task(&task.name)
          .ok_or_else(|| UnrollError::UnknownTask {
            cycle: cycle.name.clone(),
            task: task.name.clone(),
          })?;

        let mut inputs = Vec::with_capacity(task.inputs.len());
        for input in &task.inputs {
          let target = templates.data_shape(&task.name, &input.name)?;
          inputs.push((input, compile(&placement, input.into(), target)?));
        }

        let mut wait_on = Vec::with_capacity(task.wait_on.len());
        for entry in &task.wait_on {
          let target = templates.task_shape(&placement, &entry.name)?;
          wait_on.push(compile(&placement, entry.into(), target)?);
        }

        tasks.push(CompiledTask {
          placement,
          def,
          inputs,
          wait_on,
        });
      }

      cycles.push(CompiledCycle {
        name: &cycle.name,
        spec,
        tasks,
      });
    }
    Ok(cycles)
  }

  /// Create a task instance and the data instances it produces.
  fn add_task(&mut self, task: &CompiledTask<'a>, coordinates: Coordinates) -> Result<(), UnrollError> {
    let workflow: &'a WorkflowDef = self.def;
    let space = &workflow.parameters;
    let def: &'a TaskDef = task.def;
    let name: &'a str = &def.name;
    let id = TaskId::new(self.tasks.len());
    let label = canonical_label(name, &coordinates, space);

    let key = InstanceKey::new(name, coordinates.clone());
    if self.task_memo.insert(key, id).is_some() {
      return Err(WorkflowError::DuplicateInstance { label }.into());
    }

    let kind = match self.kinds.get(name) {
      Some(kind) => kind.clone(),
      None => {
        let kind = self.resolve_kind(def)?;
        self.kinds.insert(name, kind.clone());
        kind
      }
    };

    let mut outputs = Vec::with_capacity(task.placement.task.outputs.len());
    for output in &task.placement.task.outputs {
      let generated = self
        .templates
        .generated(output)
        .ok_or_else(|| UnrollError::UnknownData {
          task: name.to_string(),
          data: output.clone(),
        })?;
      let data_id = DataId::new(self.data.len());
      let data_label = canonical_label(output, &coordinates, space);
      let data_key = InstanceKey::new(output.as_str(), coordinates.clone());
      if self.data_memo.insert(data_key, data_id).is_some() {
        return Err(WorkflowError::DuplicateInstance { label: data_label }.into());
      }

      self.data.push(DataInstance {
        id: data_id,
        name: output.clone(),
        coordinates: coordinates.clone(),
        label: data_label,
        data_type: generated.data_type,
        src: generated.src.clone(),
        computer: def.computer.clone(),
        producer: Some(id),
        consumers: Vec::new(),
      });
      self.edges.push(Edge::Output { task: id, data: data_id });
      outputs.push(data_id);
    }

    trace!(task = %label, outputs = outputs.len(), "task_instance_created");
    self.tasks.push(TaskInstance {
      id,
      name: name.to_string(),
      cycle: task.placement.cycle.name.clone(),
      coordinates,
      label,
      computer: def.computer.clone(),
      kind,
      inputs: Vec::new(),
      outputs,
      wait_on: Vec::new(),
    });
    Ok(())
  }

  /// Resolve a task's local paths against the root directory and check them.
  fn resolve_kind(&self, task: &TaskDef) -> Result<TaskKind, UnrollError> {
    for path in task.kind.local_files() {
      if path.is_absolute() {
        return Err(UnrollError::AbsolutePath {
          task: task.name.clone(),
          path: path.clone(),
        });
      }
    }

    let rootdir = &self.def.rootdir;
    let kind = task.kind.map_local_files(|path| rootdir.join(path));
    for path in kind.local_files() {
      require(self.probe, &task.name, path, PathKind::File)?;
    }
    Ok(kind)
  }

  /// Bind the inputs and `wait_on` entries of one task instance.
  fn bind(&mut self, id: TaskId, task: &CompiledTask<'a>) -> Result<(), UnrollError> {
    let workflow: &'a WorkflowDef = self.def;
    let space = &workflow.parameters;
    let coordinates = self.tasks[id.index()].coordinates.clone();
    let name = task.def.name.as_str();

    for (input, binding) in &task.inputs {
      let candidates = binding.select(name, &coordinates, space)?;
      let mut instances = Vec::with_capacity(candidates.len());
      for candidate in candidates {
        let data_id = match binding.target.kind {
          TargetKind::Available(def) => self.available_instance(def, candidate)?,
          TargetKind::Generated | TargetKind::Task => {
            let key = InstanceKey::new(binding.target.name, candidate);
            match self.data_memo.get(&key) {
              Some(data_id) => *data_id,
              None => return Err(missing(name, &coordinates, &key)),
            }
          }
        };
        instances.push(data_id);
      }

      let port = input.port_name();
      for data_id in &instances {
        let consumers = &mut self.data[data_id.index()].consumers;
        if !consumers.contains(&id) {
          consumers.push(id);
        }
        self.edges.push(Edge::Input {
          data: *data_id,
          task: id,
          port: port.to_string(),
        });
      }
      debug!(
        task = %self.tasks[id.index()].label,
        port,
        bound = instances.len(),
        "port_bound"
      );
      self.tasks[id.index()].inputs.push(PortBinding {
        port: port.to_string(),
        data: input.name.clone(),
        instances,
      });
    }

    for binding in &task.wait_on {
      for candidate in binding.select(name, &coordinates, space)? {
        let key = InstanceKey::new(binding.target.name, candidate);
        let waits_for = match self.task_memo.get(&key) {
          Some(waits_for) => *waits_for,
          None => return Err(missing(name, &coordinates, &key)),
        };
        let wait_on = &mut self.tasks[id.index()].wait_on;
        if !wait_on.contains(&waits_for) {
          wait_on.push(waits_for);
          self.edges.push(Edge::WaitOn { task: id, waits_for });
        }
      }
    }
    Ok(())
  }

  /// Get or create an available data instance, checking its source on
  /// creation.
  fn available_instance(
    &mut self,
    def: &AvailableDataDef,
    coordinates: Coordinates,
  ) -> Result<DataId, UnrollError> {
    let key = InstanceKey::new(def.name.as_str(), coordinates);
    if let Some(id) = self.data_memo.get(&key) {
      return Ok(*id);
    }

    let src = def.resolved_src(&self.def.rootdir);
    if def.is_local() {
      require(self.probe, &def.name, &src, def.data_type.into())?;
    }

    let id = DataId::new(self.data.len());
    let label = canonical_label(&def.name, &key.coordinates, &self.def.parameters);
    trace!(data = %label, "available_instance_created");
    self.data.push(DataInstance {
      id,
      name: def.name.clone(),
      coordinates: key.coordinates.clone(),
      label,
      data_type: def.data_type,
      src,
      computer: def.computer.clone(),
      producer: None,
      consumers: Vec::new(),
    });
    self.data_memo.insert(key, id);
    Ok(id)
  }
}

fn missing(task: &str, coordinates: &Coordinates, key: &InstanceKey) -> UnrollError {
  UnrollError::MissingInstance {
    task: task.to_string(),
    coordinates: coordinates.to_string(),
    target: key.name.clone(),
    missing: key.coordinates.to_string(),
  }
}
