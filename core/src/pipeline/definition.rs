// sluice/src/pipeline/definition.rs

//! Contains the `Pipeline` builder and the wiring step that connects stages with
//! stage channels.

use crate::config::PipelineConfig;
use crate::core::channel::stage_channel;
use crate::core::control::StageStatus;
use crate::error::{SluiceError, SluiceResult};
use crate::stage::collaborators::{Annotator, Mutator, Publisher, RecordSource};
use crate::stage::{into_handle, Generator, Sink, StageHandle, Transformer};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{event, Level};

struct SourceSpec {
  name: String,
  source: Arc<dyn RecordSource>,
  annotator: Arc<dyn Annotator>,
}

struct TransformSpec {
  name: String,
  mutator: Arc<dyn Mutator>,
}

struct SinkSpec {
  name: String,
  publisher: Arc<dyn Publisher>,
}

/// Declarative description of a linear pipeline:
/// one generator, any number of transformers, one sink.
///
/// ```text
/// generator -> channel -> transformer* -> channel -> sink
/// ```
///
/// Extra bootstrap handles (for example a transport's connection setup) can be placed
/// ahead of the stages with [`Pipeline::with_bootstrap`]; they are started first.
pub struct Pipeline {
  pub(crate) config: PipelineConfig,
  bootstrap: Vec<StageHandle>,
  source: Option<SourceSpec>,
  transforms: Vec<TransformSpec>,
  sink: Option<SinkSpec>,
}

/// A pipeline whose channels have been created and whose stages are ready to start.
pub struct WiredPipeline {
  handles: Vec<StageHandle>,
  statuses: Vec<StageStatus>,
}

impl WiredPipeline {
  /// Status handles of the stages, upstream first.
  pub fn statuses(&self) -> &[StageStatus] {
    &self.statuses
  }

  /// Bootstrap handles in start order: extra handles, generator, transformers, sink.
  pub fn into_handles(self) -> Vec<StageHandle> {
    self.handles
  }

  pub fn into_parts(self) -> (Vec<StageHandle>, Vec<StageStatus>) {
    (self.handles, self.statuses)
  }
}

impl Pipeline {
  pub fn new(config: PipelineConfig) -> Self {
    Self {
      config,
      bootstrap: Vec::new(),
      source: None,
      transforms: Vec::new(),
      sink: None,
    }
  }

  pub fn config(&self) -> &PipelineConfig {
    &self.config
  }

  /// Adds a handle that runs before any stage starts. Handles run in insertion order.
  pub fn with_bootstrap(mut self, handle: StageHandle) -> Self {
    self.bootstrap.push(handle);
    self
  }

  /// Sets the generator stage. A second call replaces the first.
  pub fn source<S, A>(mut self, name: impl Into<String>, source: S, annotator: A) -> Self
  where
    S: RecordSource,
    A: Annotator,
  {
    self.source = Some(SourceSpec {
      name: name.into(),
      source: Arc::new(source),
      annotator: Arc::new(annotator),
    });
    self
  }

  /// Appends a transformer stage after the existing ones.
  pub fn transform<M: Mutator>(mut self, name: impl Into<String>, mutator: M) -> Self {
    self.transforms.push(TransformSpec {
      name: name.into(),
      mutator: Arc::new(mutator),
    });
    self
  }

  /// Sets the sink stage. A second call replaces the first.
  pub fn sink<P: Publisher>(mut self, name: impl Into<String>, publisher: P) -> Self {
    self.sink = Some(SinkSpec {
      name: name.into(),
      publisher: Arc::new(publisher),
    });
    self
  }

  /// Removes the transformer called `name`. Returns whether one was removed.
  pub fn remove_transform(&mut self, name: &str) -> bool {
    match self.transforms.iter().position(|t| t.name == name) {
      Some(idx) => {
        self.transforms.remove(idx);
        true
      }
      None => false,
    }
  }

  /// Stage names in data-flow order.
  pub fn stage_names(&self) -> Vec<&str> {
    self
      .source
      .iter()
      .map(|s| s.name.as_str())
      .chain(self.transforms.iter().map(|t| t.name.as_str()))
      .chain(self.sink.iter().map(|s| s.name.as_str()))
      .collect()
  }

  fn ensure_unique_names(&self) -> SluiceResult<()> {
    let mut seen = HashSet::new();
    for name in self.stage_names() {
      if !seen.insert(name) {
        return Err(SluiceError::Wiring(format!("stage name '{}' is used more than once", name)));
      }
    }
    Ok(())
  }

  /// Creates one stage channel per edge and turns every stage into a bootstrap handle.
  ///
  /// Fails if the configuration is invalid, the source or sink is missing, or two stages
  /// share a name.
  pub fn build(self) -> SluiceResult<WiredPipeline> {
    self.config.validate()?;
    self.ensure_unique_names()?;

    let Pipeline {
      config,
      bootstrap,
      source,
      transforms,
      sink,
    } = self;
    let source = source.ok_or_else(|| SluiceError::Wiring("pipeline has no source stage".to_string()))?;
    let sink = sink.ok_or_else(|| SluiceError::Wiring("pipeline has no sink stage".to_string()))?;

    let mut handles = bootstrap;
    let mut statuses = Vec::with_capacity(transforms.len() + 2);

    let (writer, mut reader) = stage_channel(
      format!("{}->{}", source.name, transforms.first().map_or(sink.name.as_str(), |t| t.name.as_str())),
      config.channel_capacity,
    );
    let generator = Generator::new(source.name, source.source, source.annotator, writer, &config);
    statuses.push(generator.status());
    handles.push(into_handle(generator));

    for (idx, spec) in transforms.iter().enumerate() {
      let downstream = transforms.get(idx + 1).map_or(sink.name.as_str(), |t| t.name.as_str());
      let (writer, next_reader) = stage_channel(format!("{}->{}", spec.name, downstream), config.channel_capacity);
      let transformer = Transformer::new(spec.name.clone(), Arc::clone(&spec.mutator), reader, writer, &config);
      statuses.push(transformer.status());
      handles.push(into_handle(transformer));
      reader = next_reader;
    }

    let sink = Sink::new(sink.name, sink.publisher, reader, &config);
    statuses.push(sink.status());
    handles.push(into_handle(sink));

    event!(
      Level::DEBUG,
      num_handles = handles.len(),
      num_stages = statuses.len(),
      "Pipeline wired."
    );
    Ok(WiredPipeline { handles, statuses })
  }
}
