//! Reference substitution engine
//!
//! Scans text for reference tokens and replaces each one that resolves to
//! an entity with the renderer's output. Everything else, including tokens
//! that do not resolve, is copied through byte for byte.
//!
//! Per token:
//! 1. qualifier → project, via the document's [`ResolutionCache`] then the
//!    [`ProjectResolver`]; no project keeps the token
//! 2. (project, iid) → entity via the [`EntityStore`]; not found or an
//!    unparsable iid keeps the token
//! 3. on success the renderer output replaces the token and the entity is
//!    recorded in the document's [`ReferenceCollector`]
//!
//! A store fault aborts the document and is returned as-is; no partial
//! output is produced.
//!
//! ```
//! use refmark::core::filter::ReferenceFilter;
//! use refmark::core::identity::{Iid, MilestoneId, ProjectHandle, ProjectId};
//! use refmark::core::pattern::ReferenceToken;
//! use refmark::core::project::Project;
//! use refmark::core::store::MemoryStore;
//! use refmark::entities::Milestone;
//!
//! let web = Project::new(ProjectId(1), ProjectHandle::parse("acme/web").unwrap());
//! let store = MemoryStore::new()
//!     .with_project(web.clone())
//!     .with_milestone(Milestone::new(MilestoneId(10), web.id, Iid(5), "Beta"));
//!
//! let filter = ReferenceFilter::for_milestones(&store, &store);
//! let mut renderer = |_: &ReferenceToken<'_>, m: &Milestone, _: &Project| format!("[{}]", m.title);
//! let rendered = filter.render_document("See %5", &web, &mut renderer).unwrap();
//! assert_eq!(rendered.output, "See [Beta]");
//! assert_eq!(rendered.references.len(), 1);
//! ```

use tracing::{debug, trace};

use crate::core::cache::ResolutionCache;
use crate::core::collector::ReferenceCollector;
use crate::core::entity::Referable;
use crate::core::identity::Iid;
use crate::core::pattern::{ReferencePattern, ReferenceToken};
use crate::core::project::Project;
use crate::core::resolver::ProjectResolver;
use crate::core::store::{EntityStore, ProjectStore, StoreError};

/// Builds the replacement text for a resolved token
///
/// `Some` is inserted verbatim. It should not itself contain a raw token,
/// or a second pass over the output would claim it again. `None` keeps the
/// token unchanged and the entity is not collected.
///
/// Plain closures returning `String` always render.
pub trait Renderer<E> {
    fn render(&mut self, token: &ReferenceToken<'_>, entity: &E, project: &Project) -> Option<String>;
}

impl<E, F> Renderer<E> for F
where
    F: FnMut(&ReferenceToken<'_>, &E, &Project) -> String,
{
    fn render(&mut self, token: &ReferenceToken<'_>, entity: &E, project: &Project) -> Option<String> {
        Some(self(token, entity, project))
    }
}

/// Counters for one document pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Tokens matched by the grammar
    pub tokens: usize,
    /// Tokens replaced with rendered output
    pub substituted: usize,
    /// Tokens whose qualifier named no project
    pub unresolved_projects: usize,
    /// Tokens whose iid named no entity in the resolved project
    pub unresolved_entities: usize,
    /// Tokens whose digits did not fit an iid
    pub malformed: usize,
    /// Resolved tokens the renderer declined
    pub unrendered: usize,
    /// Calls made to the project resolver (cache misses)
    pub resolver_calls: usize,
}

/// State owned by one document pass
///
/// Create one per document; never share between documents.
#[derive(Debug)]
pub struct RenderContext<'p, E: Referable> {
    current_project: &'p Project,
    cache: ResolutionCache,
    collector: ReferenceCollector<E>,
    stats: FilterStats,
}

impl<'p, E: Referable> RenderContext<'p, E> {
    pub fn new(current_project: &'p Project) -> Self {
        Self {
            current_project,
            cache: ResolutionCache::new(),
            collector: ReferenceCollector::new(),
            stats: FilterStats::default(),
        }
    }

    pub fn current_project(&self) -> &Project {
        self.current_project
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn collector(&self) -> &ReferenceCollector<E> {
        &self.collector
    }

    pub fn collector_mut(&mut self) -> &mut ReferenceCollector<E> {
        &mut self.collector
    }

    pub fn stats(&self) -> FilterStats {
        self.stats
    }
}

/// Result of filtering one document
#[derive(Debug, Clone)]
pub struct Rendered<E> {
    pub output: String,
    /// Entities substituted into `output`, in first-seen order
    pub references: Vec<E>,
    pub stats: FilterStats,
}

/// The substitution engine for one reference kind
pub struct ReferenceFilter<'a, P, S> {
    pattern: &'a ReferencePattern,
    projects: P,
    entities: S,
}

impl<P, S> ReferenceFilter<'static, P, S>
where
    P: ProjectStore,
    S: EntityStore,
{
    /// Filter for `%N` / `namespace/project%N` milestone references
    pub fn for_milestones(projects: P, entities: S) -> Self {
        Self::new(ReferencePattern::milestone(), projects, entities)
    }
}

impl<'a, P, S> ReferenceFilter<'a, P, S>
where
    P: ProjectStore,
    S: EntityStore,
{
    pub fn new(pattern: &'a ReferencePattern, projects: P, entities: S) -> Self {
        Self {
            pattern,
            projects,
            entities,
        }
    }

    pub fn pattern(&self) -> &ReferencePattern {
        self.pattern
    }

    /// Replace every resolvable token in `text`
    ///
    /// Resolutions are memoized in `ctx` and successes are recorded in its
    /// collector. Returns the rebuilt text, or the first store fault.
    pub fn process<R>(
        &self,
        text: &str,
        ctx: &mut RenderContext<'_, S::Entity>,
        renderer: &mut R,
    ) -> Result<String, StoreError>
    where
        R: Renderer<S::Entity> + ?Sized,
    {
        let resolver = ProjectResolver::new(&self.projects);

        let output = self.pattern.replace::<_, StoreError>(text, |token| {
            ctx.stats.tokens += 1;

            let project = match ctx.cache.get(token.qualifier()) {
                Some(cached) => cached.cloned(),
                None => {
                    ctx.stats.resolver_calls += 1;
                    let resolved = resolver.resolve(token.qualifier(), ctx.current_project)?;
                    ctx.cache.put(token.qualifier(), resolved.clone());
                    resolved
                }
            };

            let Some(project) = project else {
                ctx.stats.unresolved_projects += 1;
                return Ok(None);
            };

            let iid = match token.iid() {
                Ok(iid) => iid,
                Err(e) => {
                    debug!(token = token.raw(), error = %e, "ignoring malformed reference");
                    ctx.stats.malformed += 1;
                    return Ok(None);
                }
            };

            let Some(entity) = self.lookup(&project, iid)? else {
                debug!(
                    kind = <S::Entity as Referable>::KIND,
                    project = %project.handle,
                    %iid,
                    "reference does not resolve"
                );
                ctx.stats.unresolved_entities += 1;
                return Ok(None);
            };

            let Some(replacement) = renderer.render(token, &entity, &project) else {
                debug!(token = token.raw(), "renderer declined reference");
                ctx.stats.unrendered += 1;
                return Ok(None);
            };
            trace!(token = token.raw(), title = entity.title(), "substituted reference");
            ctx.collector.record(entity);
            ctx.stats.substituted += 1;
            Ok(Some(replacement))
        })?;

        Ok(output)
    }

    /// Filter one document with a fresh context
    pub fn render_document<R>(
        &self,
        text: &str,
        current_project: &Project,
        renderer: &mut R,
    ) -> Result<Rendered<S::Entity>, StoreError>
    where
        R: Renderer<S::Entity> + ?Sized,
    {
        let mut ctx = RenderContext::new(current_project);
        let output = self.process(text, &mut ctx, renderer)?;
        let stats = ctx.stats();

        debug!(
            kind = <S::Entity as Referable>::KIND,
            project = %current_project.handle,
            tokens = stats.tokens,
            substituted = stats.substituted,
            resolver_calls = stats.resolver_calls,
            "filtered document"
        );

        Ok(Rendered {
            output,
            references: ctx.collector.drain(),
            stats,
        })
    }

    /// Look up an entity by (project, iid); not found is `Ok(None)`
    pub fn lookup(&self, project: &Project, iid: Iid) -> Result<Option<S::Entity>, StoreError> {
        self.entities.find_by_local_id(project, iid)
    }
}
