//! Group-by resolution: from metric source nodes to the trie of resolvable
//! dunder names.
//!
//! Two stage resolvers share one engine: a recipe-writing DFS out of a source
//! metric node. [`SimpleAttributeResolver`] targets group-by attributes,
//! [`GroupByMetricResolver`] targets metrics usable as group-bys, and
//! [`CompleteGroupByResolver`] unions both stages. The [`GroupByItemResolver`]
//! facade owns the graph and the result cache, decomposes complex metrics
//! into their measure-backed leaves, and intersect-merges multi-metric
//! requests.

use std::collections::{BTreeSet, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use semgraph_core::build::SemanticGraphBuilder;
use semgraph_core::error::GraphBuildError;
use semgraph_core::filtering::{ElementFilter, GroupByItemProperty};
use semgraph_core::graph::edge::EdgeTypeTag;
use semgraph_core::graph::label::GraphLabel;
use semgraph_core::graph::node::{SemanticGraphNode, TimeAccess, METRIC_TIME_ELEMENT_NAME};
use semgraph_core::graph::{NodeHandle, SemanticGraph};
use semgraph_core::pathfind::{
    find_paths_dfs, AttributeSearchWeights, PathfinderOptions, TraversalPath, TraversalProfile,
};
use semgraph_core::recipe::step::AttributeRecipeStep;
use semgraph_core::recipe::{AttributeRecipe, AttributeRecipeWriterPath};
use semgraph_manifest::{
    ExpandedTimeGranularity, ManifestObjectLookup, MetricReference, SemanticManifest,
    TimeGranularity,
};

use crate::cache::{CacheStats, ResolutionCache, ResolutionCacheKey, DEFAULT_CACHE_CAPACITY};
use crate::trie::{
    DunderName, DunderNameDescriptor, DunderNameTrie, GroupByElementType, ResolvedGroupByItem,
};

/// Errors surfaced by the resolution facade.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The named metric has no node in the semantic graph.
    #[error("metric {metric} has no node in the semantic graph")]
    MetricNodeNotFound { metric: MetricReference },
    /// A resolution request named no metrics at all.
    #[error("resolution requires at least one source metric")]
    NoSourceNodes,
    #[error(transparent)]
    Build(#[from] GraphBuildError),
}

/// The outcome of one resolution request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrieResolutionResult {
    pub dunder_name_trie: DunderNameTrie,
    pub traversal_profile: TraversalProfile,
    pub duration: Duration,
}

// ---------------------------------------------------------------------------
// Descriptor derivation
// ---------------------------------------------------------------------------

fn join_depth(recipe: &AttributeRecipe) -> usize {
    recipe
        .steps()
        .iter()
        .filter(|step| matches!(step, AttributeRecipeStep::JoinModelViaEntity { .. }))
        .count()
}

/// The grain of the time column the recipe selected, before any truncation.
/// Metric time reads at the grain of the aggregation time dimension.
fn source_time_grain(recipe: &AttributeRecipe) -> Option<TimeGranularity> {
    let mut aggregation = None;
    let mut selected = None;
    for step in recipe.steps() {
        match step {
            AttributeRecipeStep::SetAggregationTimeSource { granularity, .. } => {
                aggregation = Some(*granularity);
            }
            AttributeRecipeStep::SelectTimeDimension { granularity, .. } => {
                selected = Some(*granularity);
            }
            AttributeRecipeStep::SelectMetricTime => {
                selected = aggregation;
            }
            _ => {}
        }
    }
    selected
}

/// Builds the descriptor for a path that ended on `node` with `recipe`.
/// `None` for nodes that are not selectable group-by targets.
fn describe(node: &SemanticGraphNode, recipe: &AttributeRecipe) -> Option<DunderNameDescriptor> {
    let element_type = match node {
        SemanticGraphNode::CategoricalDimensionAttribute { .. } => GroupByElementType::Dimension,
        SemanticGraphNode::KeyAttribute { .. } => GroupByElementType::Entity,
        SemanticGraphNode::TimeDimension { .. }
        | SemanticGraphNode::TimeAttribute { .. }
        | SemanticGraphNode::MetricTime => GroupByElementType::TimeDimension,
        SemanticGraphNode::SimpleMetric { .. } => GroupByElementType::Metric,
        _ => return None,
    };

    let time_grain = match node {
        SemanticGraphNode::TimeAttribute { access: TimeAccess::Granularity(granularity), .. } => {
            Some(granularity.clone())
        }
        SemanticGraphNode::TimeDimension { granularity, .. } => {
            Some(ExpandedTimeGranularity::from_standard(*granularity))
        }
        _ => None,
    };
    let date_part = match node {
        SemanticGraphNode::TimeAttribute { access: TimeAccess::DatePart(date_part), .. } => {
            Some(*date_part)
        }
        _ => None,
    };

    // Locality is a property of the path, not the node: the same attribute
    // resolves as local for one metric and joined for another.
    let mut properties = BTreeSet::new();
    let joins = join_depth(recipe);
    let correlated = recipe
        .steps()
        .iter()
        .any(|step| matches!(step, AttributeRecipeStep::CorrelateSubquery { .. }));
    if joins == 0 && !correlated {
        properties.insert(GroupByItemProperty::Local);
    } else {
        properties.insert(GroupByItemProperty::Joined);
    }
    if joins >= 2 {
        properties.insert(GroupByItemProperty::MultiHop);
    }
    match node {
        SemanticGraphNode::KeyAttribute { .. } => {
            properties.insert(GroupByItemProperty::Entity);
        }
        SemanticGraphNode::SimpleMetric { .. } => {
            properties.insert(GroupByItemProperty::Metric);
        }
        _ => {}
    }
    if node.element_name() == Some(METRIC_TIME_ELEMENT_NAME) {
        properties.insert(GroupByItemProperty::MetricTime);
    }
    match node {
        SemanticGraphNode::TimeAttribute { access: TimeAccess::DatePart(_), .. } => {
            properties.insert(GroupByItemProperty::DatePart);
        }
        SemanticGraphNode::TimeAttribute { access: TimeAccess::Granularity(granularity), .. } => {
            if granularity.is_custom() {
                properties.insert(GroupByItemProperty::CustomGranularity);
            } else if source_time_grain(recipe)
                .is_some_and(|grain| grain != granularity.base_granularity)
            {
                properties.insert(GroupByItemProperty::DerivedTimeGranularity);
            }
        }
        _ => {}
    }

    Some(DunderNameDescriptor {
        element_type,
        time_grain,
        date_part,
        properties,
        owning_model_ids: recipe.owning_model().cloned().into_iter().collect(),
        derived_from_model_ids: recipe.model_trail(),
    })
}

/// Admits one discovered path into the trie, applying the degenerate-name
/// skips, the element filter, and the shortest-join-trail collision rule.
fn admit(
    trie: &mut DunderNameTrie,
    filter: &ElementFilter,
    node: &SemanticGraphNode,
    recipe: &AttributeRecipe,
) {
    let Some(segments) = recipe.name_segments() else {
        // No element selected yet -- a seed node yielded as its own target.
        return;
    };
    let Some(element) = recipe.element_name() else {
        return;
    };
    let links = recipe.entity_links();
    // A joined key re-selecting its own link (`listing__listing`) says
    // nothing new about the data.
    if links.last().map(|link| link.as_str()) == Some(element) {
        return;
    }
    // Metric time is model-independent; an entity-linked rendition of it is
    // meaningless.
    if element == METRIC_TIME_ELEMENT_NAME && !links.is_empty() {
        return;
    }
    let Some(descriptor) = describe(node, recipe) else {
        return;
    };
    if !filter.admits(element, &descriptor.properties) {
        return;
    }

    let name = DunderName::new(segments);
    let item = ResolvedGroupByItem { descriptor, recipe: recipe.clone() };
    let keep_existing = match trie.get(&name) {
        Some(existing) => join_depth(&existing.recipe) <= join_depth(&item.recipe),
        None => false,
    };
    if !keep_existing {
        trie.insert(name, item);
    }
}

// ---------------------------------------------------------------------------
// Stage resolvers
// ---------------------------------------------------------------------------

fn resolve_stage(
    graph: &SemanticGraph,
    source: NodeHandle,
    targets: HashSet<NodeHandle>,
    weights: AttributeSearchWeights,
    options: PathfinderOptions,
    filter: &ElementFilter,
) -> (DunderNameTrie, TraversalProfile) {
    let seed = AttributeRecipeWriterPath::starting_at(graph, source);
    let mut paths = find_paths_dfs(graph, seed, targets, weights, options);

    let mut trie = DunderNameTrie::new();
    while let Some(path) = paths.next() {
        let Some(end) = path.last_node() else { continue };
        let Some(node) = graph.node(end) else { continue };
        let Some(recipe) = path.latest_recipe() else { continue };
        admit(&mut trie, filter, node, recipe);
    }
    (trie, paths.profile())
}

/// Resolves the group-by attributes reachable from one source metric node.
#[derive(Debug)]
pub struct SimpleAttributeResolver<'g> {
    graph: &'g SemanticGraph,
    filter: ElementFilter,
    options: PathfinderOptions,
}

impl<'g> SimpleAttributeResolver<'g> {
    pub fn new(graph: &'g SemanticGraph, filter: ElementFilter) -> Self {
        Self { graph, filter, options: PathfinderOptions::default() }
    }

    pub fn with_options(mut self, options: PathfinderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn resolve(&self, source: NodeHandle) -> (DunderNameTrie, TraversalProfile) {
        let targets: HashSet<NodeHandle> =
            self.graph.nodes_with_label(GraphLabel::GroupByAttribute).collect();
        resolve_stage(
            self.graph,
            source,
            targets,
            AttributeSearchWeights::for_attributes(self.filter.clone()),
            self.options.clone(),
            &self.filter,
        )
    }
}

/// Resolves the metrics reachable as group-by items from one source metric
/// node. Same engine as the attribute stage, with edges into metric nodes
/// kept open.
#[derive(Debug)]
pub struct GroupByMetricResolver<'g> {
    graph: &'g SemanticGraph,
    filter: ElementFilter,
    options: PathfinderOptions,
}

impl<'g> GroupByMetricResolver<'g> {
    pub fn new(graph: &'g SemanticGraph, filter: ElementFilter) -> Self {
        Self { graph, filter, options: PathfinderOptions::default() }
    }

    pub fn with_options(mut self, options: PathfinderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn resolve(&self, source: NodeHandle) -> (DunderNameTrie, TraversalProfile) {
        let targets: HashSet<NodeHandle> =
            self.graph.nodes_with_label(GraphLabel::GroupByMetric).collect();
        resolve_stage(
            self.graph,
            source,
            targets,
            AttributeSearchWeights::for_metrics(self.filter.clone()),
            self.options.clone(),
            &self.filter,
        )
    }
}

/// Both stages for one source node, with per-stage profiles.
#[derive(Debug, Clone)]
pub struct CompleteResolution {
    pub trie: DunderNameTrie,
    pub profile: TraversalProfile,
    pub attribute_profile: TraversalProfile,
    pub metric_profile: TraversalProfile,
}

/// Runs the attribute and metric stages and unions their tries. A name found
/// by both stages is ambiguous and drops out in the union.
#[derive(Debug)]
pub struct CompleteGroupByResolver<'g> {
    graph: &'g SemanticGraph,
    filter: ElementFilter,
    options: PathfinderOptions,
}

impl<'g> CompleteGroupByResolver<'g> {
    pub fn new(graph: &'g SemanticGraph, filter: ElementFilter) -> Self {
        Self { graph, filter, options: PathfinderOptions::default() }
    }

    pub fn with_options(mut self, options: PathfinderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn resolve(&self, source: NodeHandle) -> CompleteResolution {
        let attributes = SimpleAttributeResolver::new(self.graph, self.filter.clone())
            .with_options(self.options.clone());
        let (attribute_trie, attribute_profile) = attributes.resolve(source);

        // The metric stage cannot produce an admissible item when the filter
        // denies the metric property outright.
        let (metric_trie, profile) = if self.filter.excludes(GroupByItemProperty::Metric) {
            (DunderNameTrie::new(), attribute_profile)
        } else {
            let metrics = GroupByMetricResolver::new(self.graph, self.filter.clone())
                .with_options(self.options.clone());
            let (metric_trie, metric_profile) = metrics.resolve(source);
            (metric_trie, attribute_profile + metric_profile)
        };
        let metric_profile = profile.diff(&attribute_profile);

        CompleteResolution {
            trie: DunderNameTrie::union([attribute_trie, metric_trie]),
            profile,
            attribute_profile,
            metric_profile,
        }
    }
}

// ---------------------------------------------------------------------------
// Facade
// ---------------------------------------------------------------------------

/// Measure-backed leaves of a complex metric, found by walking `ComposedOf`
/// edges only. Generic reachability would cross metric-source edges into
/// unrelated metrics sharing a model.
fn composition_leaves(graph: &SemanticGraph, root: NodeHandle) -> Vec<NodeHandle> {
    let mut stack = vec![root];
    let mut seen: HashSet<NodeHandle> = HashSet::from([root]);
    let mut leaves = Vec::new();
    while let Some(node) = stack.pop() {
        for edge in graph.outgoing_edges(node) {
            let Some(payload) = graph.edge(edge) else { continue };
            if payload.ty != EdgeTypeTag::ComposedOf {
                continue;
            }
            let Some(head) = graph.edge_head(edge) else { continue };
            if !seen.insert(head) {
                continue;
            }
            match graph.node(head) {
                Some(SemanticGraphNode::SimpleMetric { .. }) => leaves.push(head),
                Some(SemanticGraphNode::ComplexMetric { .. }) => stack.push(head),
                _ => {}
            }
        }
    }
    leaves
}

/// The crate facade: owns the semantic graph and the resolution cache.
pub struct GroupByItemResolver {
    graph: Arc<SemanticGraph>,
    cache: ResolutionCache,
    options: PathfinderOptions,
}

impl GroupByItemResolver {
    /// Builds the semantic graph for a manifest and wraps it in a resolver
    /// with the default cache capacity.
    pub fn for_manifest(manifest: Arc<SemanticManifest>) -> Result<Self, ResolveError> {
        let lookup = ManifestObjectLookup::new(manifest);
        let graph = SemanticGraphBuilder::build(&lookup)?;
        Ok(Self::new(Arc::new(graph), DEFAULT_CACHE_CAPACITY))
    }

    pub fn new(graph: Arc<SemanticGraph>, cache_capacity: NonZeroUsize) -> Self {
        Self {
            graph,
            cache: ResolutionCache::new(cache_capacity),
            options: PathfinderOptions::default(),
        }
    }

    /// Pathfinder options applied to every resolution. Fixed per resolver so
    /// cached results stay valid for its whole lifetime.
    pub fn with_pathfinder_options(mut self, options: PathfinderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn graph(&self) -> &SemanticGraph {
        &self.graph
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Resolves the group-by names available to a single metric.
    pub fn resolve_metric(
        &self,
        metric: &MetricReference,
        filter: &ElementFilter,
    ) -> Result<Arc<TrieResolutionResult>, ResolveError> {
        self.resolve_metrics(std::slice::from_ref(metric), filter)
    }

    /// Resolves the group-by names available to every named metric at once:
    /// the intersection of each metric's names, with merged descriptors.
    pub fn resolve_metrics(
        &self,
        metrics: &[MetricReference],
        filter: &ElementFilter,
    ) -> Result<Arc<TrieResolutionResult>, ResolveError> {
        if metrics.is_empty() {
            return Err(ResolveError::NoSourceNodes);
        }
        let mut sources: Vec<NodeHandle> = Vec::new();
        for metric in metrics {
            for handle in self.metric_sources(metric)? {
                if !sources.contains(&handle) {
                    sources.push(handle);
                }
            }
        }
        if sources.is_empty() {
            return Err(ResolveError::NoSourceNodes);
        }

        let key = ResolutionCacheKey::new(
            sources.iter().filter_map(|&handle| self.graph.node(handle).cloned()).collect(),
            filter.clone(),
        );
        if let Some(result) = self.cache.get(&key) {
            tracing::debug!(
                "resolution cache hit for {} metric(s): {} name(s)",
                metrics.len(),
                result.dunder_name_trie.len(),
            );
            return Ok(result);
        }

        let started = Instant::now();
        let resolver = CompleteGroupByResolver::new(&self.graph, filter.clone())
            .with_options(self.options.clone());
        let mut profile = TraversalProfile::new();
        let mut tries = Vec::with_capacity(sources.len());
        for &source in &sources {
            let resolution = resolver.resolve(source);
            profile = profile + resolution.profile;
            tries.push(resolution.trie);
        }
        let trie = DunderNameTrie::intersect_merge(tries);
        let duration = started.elapsed();
        tracing::debug!(
            "resolved {} group-by name(s) from {} source(s) in {:?}",
            trie.len(),
            sources.len(),
            duration,
        );

        let result =
            Arc::new(TrieResolutionResult { dunder_name_trie: trie, traversal_profile: profile, duration });
        self.cache.put(key, Arc::clone(&result));
        Ok(result)
    }

    /// The source nodes a metric resolves from: its own node when it is
    /// measure-backed, otherwise the measure-backed leaves of its composition.
    fn metric_sources(&self, metric: &MetricReference) -> Result<Vec<NodeHandle>, ResolveError> {
        let simple = SemanticGraphNode::SimpleMetric { metric: metric.clone() };
        if let Some(handle) = self.graph.node_handle(&simple) {
            return Ok(vec![handle]);
        }
        let complex = SemanticGraphNode::ComplexMetric { metric: metric.clone() };
        match self.graph.node_handle(&complex) {
            Some(root) => Ok(composition_leaves(&self.graph, root)),
            None => Err(ResolveError::MetricNodeNotFound { metric: metric.clone() }),
        }
    }
}
