// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_graphql::dynamic;
use async_graphql::dynamic::Field;
use async_graphql::dynamic::FieldFuture;
use async_graphql::dynamic::InputValue;
use async_graphql::dynamic::Object;
use async_graphql::dynamic::ResolverContext;
use async_graphql::dynamic::Type;
use async_graphql::dynamic::TypeRef;

use super::capability;
use super::connection::connection_object;
use super::connection::connection_type_name;
use super::connection::PageInfo;
use super::error::BuildError;
use super::groups;
use super::wire::WireObject;
use crate::defaults::MAX_QUERY_COMPLEXITY;
use crate::defaults::MAX_QUERY_DEPTH;
use crate::storage::Storage;
use crate::storage::WatchlistStore;

const QUERY: &str = "Query";
const MUTATION: &str = "Mutation";
const BUILTIN_SCALARS: [&str; 5] =
    [TypeRef::STRING, TypeRef::INT, TypeRef::FLOAT, TypeRef::BOOLEAN, TypeRef::ID];

/// Field groups backed by the storage handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum QueryGroup {
    Core,
    Historical,
    Analytics,
    SystemContracts,
    Address,
    Delegation,
    TokenHolders,
}

impl QueryGroup {
    pub const ALL: [QueryGroup; 7] = [
        QueryGroup::Core,
        QueryGroup::Historical,
        QueryGroup::Analytics,
        QueryGroup::SystemContracts,
        QueryGroup::Address,
        QueryGroup::Delegation,
        QueryGroup::TokenHolders,
    ];
}

impl fmt::Display for QueryGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryGroup::Core => "core",
            QueryGroup::Historical => "historical",
            QueryGroup::Analytics => "analytics",
            QueryGroup::SystemContracts => "system contracts",
            QueryGroup::Address => "address indexing",
            QueryGroup::Delegation => "delegation",
            QueryGroup::TokenHolders => "token holders",
        };
        f.write_str(name)
    }
}

/// A named field waiting in the builder registry.
pub struct FieldRegistration {
    name: String,
    returns: TypeRef,
    field: Field,
}

impl FieldRegistration {
    pub fn new<F>(name: &str, returns: TypeRef, resolver: F) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            returns: returns.clone(),
            field: Field::new(name, returns, resolver),
        }
    }

    pub fn argument(mut self, input: InputValue) -> Self {
        self.field = self.field.argument(input);
        self
    }

    pub fn arguments(self, inputs: impl IntoIterator<Item = InputValue>) -> Self {
        inputs.into_iter().fold(self, |registration, input| registration.argument(input))
    }

    pub fn description(mut self, description: &str) -> Self {
        self.field = self.field.description(description);
        self
    }
}

/// Replaces a field of the same name in place, keeping its position.
fn upsert(registry: &mut Vec<FieldRegistration>, registration: FieldRegistration, kind: &str) {
    match registry.iter_mut().find(|existing| existing.name == registration.name) {
        Some(existing) => {
            tracing::debug!("{kind} field `{}` registered again, replacing", registration.name);
            *existing = registration;
        }
        None => registry.push(registration),
    }
}

fn field_names(registry: &[FieldRegistration]) -> Vec<String> {
    registry.iter().map(|registration| registration.name.clone()).collect()
}

fn base_type_name(ty: &TypeRef) -> &str {
    match ty {
        TypeRef::Named(name) => name.as_ref(),
        TypeRef::NonNull(inner) | TypeRef::List(inner) => base_type_name(inner),
    }
}

/// Assembles the query surface group by group.
///
/// Every method consumes the builder and hands it back, so a chain like
/// `SchemaBuilder::new(storage).with_core_queries().with_analytics_queries()`
/// ends in [`SchemaBuilder::build`]. Groups may be added in any order and
/// any number of times.
pub struct SchemaBuilder {
    storage: Arc<dyn Storage>,
    queries: Vec<FieldRegistration>,
    mutations: Vec<FieldRegistration>,
    types: BTreeMap<String, Type>,
}

impl SchemaBuilder {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            queries: Vec::new(),
            mutations: Vec::new(),
            types: BTreeMap::new(),
        }
    }

    pub fn with_core_queries(self) -> Self {
        tracing::debug!("registering core queries");
        groups::chain::register(self)
    }

    pub fn with_historical_queries(self) -> Self {
        tracing::debug!("registering historical queries");
        groups::historical::register(self)
    }

    pub fn with_analytics_queries(self) -> Self {
        tracing::debug!("registering analytics queries");
        groups::analytics::register(self)
    }

    pub fn with_system_contract_queries(self) -> Self {
        tracing::debug!("registering system contract queries");
        groups::system_contracts::register(self)
    }

    pub fn with_address_queries(self) -> Self {
        tracing::debug!("registering address indexing queries");
        groups::address::register(self)
    }

    pub fn with_delegation_queries(self) -> Self {
        tracing::debug!("registering delegation queries");
        groups::delegation::register(self)
    }

    pub fn with_token_holder_queries(self) -> Self {
        tracing::debug!("registering token holder queries");
        groups::token_holders::register(self)
    }

    /// Watched addresses, plus the mutations editing them.
    pub fn with_watchlist(self, store: Arc<dyn WatchlistStore>) -> Self {
        tracing::debug!("registering watchlist queries and mutations");
        groups::watchlist::register(self, store)
    }

    pub fn with_group(self, group: QueryGroup) -> Self {
        match group {
            QueryGroup::Core => self.with_core_queries(),
            QueryGroup::Historical => self.with_historical_queries(),
            QueryGroup::Analytics => self.with_analytics_queries(),
            QueryGroup::SystemContracts => self.with_system_contract_queries(),
            QueryGroup::Address => self.with_address_queries(),
            QueryGroup::Delegation => self.with_delegation_queries(),
            QueryGroup::TokenHolders => self.with_token_holder_queries(),
        }
    }

    pub fn with_all_queries(self) -> Self {
        QueryGroup::ALL.into_iter().fold(self, |builder, group| builder.with_group(group))
    }

    pub(crate) fn storage(&self) -> Arc<dyn Storage> {
        self.storage.clone()
    }

    pub(crate) fn query(mut self, registration: FieldRegistration) -> Self {
        upsert(&mut self.queries, registration, "query");
        self
    }

    pub(crate) fn mutation(mut self, registration: FieldRegistration) -> Self {
        upsert(&mut self.mutations, registration, "mutation");
        self
    }

    /// Registers a type under `name` unless it is already known.
    pub(crate) fn with_type(mut self, name: &str, make: impl FnOnce() -> Type) -> Self {
        if !self.types.contains_key(name) {
            self.types.insert(name.to_string(), make());
        }
        self
    }

    pub(crate) fn with_wire<T: WireObject>(self) -> Self {
        self.with_type(T::TYPE_NAME, || T::object().into())
    }

    pub(crate) fn with_connection<T: WireObject>(self) -> Self {
        self.with_wire::<T>()
            .with_wire::<PageInfo>()
            .with_type(&connection_type_name(T::TYPE_NAME), || connection_object::<T>().into())
    }

    fn validate(&self) -> Result<(), BuildError> {
        if self.queries.is_empty() {
            return Err(BuildError::NoQueryFields);
        }
        for registration in self.queries.iter().chain(self.mutations.iter()) {
            let type_name = base_type_name(&registration.returns);
            if !BUILTIN_SCALARS.contains(&type_name) && !self.types.contains_key(type_name) {
                return Err(BuildError::UnknownType {
                    field: registration.name.clone(),
                    type_name: type_name.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn build(self) -> Result<IndexerSchema, BuildError> {
        self.validate()?;

        let capabilities = capability::detect(self.storage.as_ref());
        if capabilities.is_empty() {
            tracing::info!("storage backend provides no optional capabilities");
        }
        for capability in capabilities {
            tracing::info!("storage backend provides {capability}");
        }

        let query_fields = field_names(&self.queries);
        let mutation_fields = field_names(&self.mutations);

        let query = self.queries.into_iter().fold(Object::new(QUERY), |object, registration| {
            object.field(registration.field)
        });
        let mutation_name = (!mutation_fields.is_empty()).then_some(MUTATION);
        let mut schema = dynamic::Schema::build(QUERY, mutation_name, None).register(query);
        if mutation_name.is_some() {
            let mutation = self.mutations.into_iter().fold(Object::new(MUTATION), |object, r| {
                object.field(r.field)
            });
            schema = schema.register(mutation);
        }
        for ty in self.types.into_values() {
            schema = schema.register(ty);
        }
        let schema = schema
            .limit_depth(MAX_QUERY_DEPTH)
            .limit_complexity(MAX_QUERY_COMPLEXITY)
            .finish()
            .map_err(|err| BuildError::Engine(err.to_string()))?;

        tracing::info!(
            "schema built: {} query fields, {} mutation fields",
            query_fields.len(),
            mutation_fields.len()
        );
        Ok(IndexerSchema { schema, query_fields, mutation_fields })
    }
}

/// Executable, read-only schema.
#[derive(Clone)]
pub struct IndexerSchema {
    schema: dynamic::Schema,
    query_fields: Vec<String>,
    mutation_fields: Vec<String>,
}

impl IndexerSchema {
    /// Query field names in registration order.
    pub fn query_fields(&self) -> &[String] {
        &self.query_fields
    }

    pub fn mutation_fields(&self) -> &[String] {
        &self.mutation_fields
    }

    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }

    pub async fn execute(
        &self,
        request: impl Into<async_graphql::Request>,
    ) -> async_graphql::Response {
        self.schema.execute(request.into()).await
    }

    /// Engine handle for the HTTP integration.
    pub fn executor(&self) -> dynamic::Schema {
        self.schema.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn storage() -> Arc<dyn Storage> {
        Arc::new(MemoryStorage::with_generated_chain(5, 1))
    }

    #[test]
    fn test_empty_builder_is_rejected() {
        let err = SchemaBuilder::new(storage()).build().err();
        assert_eq!(err, Some(BuildError::NoQueryFields));
    }

    #[test]
    fn test_unknown_return_type_is_rejected() {
        let builder = SchemaBuilder::new(storage()).query(FieldRegistration::new(
            "ghost",
            TypeRef::named_nn("Ghost"),
            |_| FieldFuture::from_value(None),
        ));
        let err = builder.build().err();
        assert_eq!(
            err,
            Some(BuildError::UnknownType { field: "ghost".into(), type_name: "Ghost".into() })
        );
    }

    #[test]
    fn test_last_registration_wins() {
        let schema = SchemaBuilder::new(storage())
            .with_core_queries()
            .with_analytics_queries()
            .with_core_queries()
            .build()
            .unwrap();
        let fields = schema.query_fields();
        assert_eq!(fields.iter().filter(|name| *name == "chainHeight").count(), 1);
        assert_eq!(fields[0], "chainHeight");
        assert!(schema.mutation_fields().is_empty());
    }

    #[test]
    fn test_every_single_group_builds() {
        for group in QueryGroup::ALL {
            let schema = SchemaBuilder::new(storage()).with_group(group).build();
            assert!(schema.is_ok(), "{group} failed: {:?}", schema.err());
        }
    }

    #[test]
    fn test_group_order_does_not_matter() {
        let forward = SchemaBuilder::new(storage()).with_all_queries().build().unwrap();
        let reversed = QueryGroup::ALL
            .into_iter()
            .rev()
            .fold(SchemaBuilder::new(storage()), |builder, group| builder.with_group(group))
            .build()
            .unwrap();
        let mut a = forward.query_fields().to_vec();
        let mut b = reversed.query_fields().to_vec();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    fn sorted(fields: &[String]) -> Vec<String> {
        let mut fields = fields.to_vec();
        fields.sort();
        fields
    }

    #[test]
    fn test_rotations_with_watchlist_anywhere() {
        use crate::storage::MemoryWatchlist;

        let reference = SchemaBuilder::new(storage())
            .with_all_queries()
            .with_watchlist(Arc::new(MemoryWatchlist::default()))
            .build()
            .unwrap();
        let expected_queries = sorted(reference.query_fields());
        let expected_mutations = sorted(reference.mutation_fields());

        for shift in 0..QueryGroup::ALL.len() {
            let mut order = QueryGroup::ALL.to_vec();
            order.rotate_left(shift);
            for watch_at in [0, shift, order.len()] {
                let mut builder = SchemaBuilder::new(storage());
                for (position, group) in order.iter().enumerate() {
                    if position == watch_at {
                        builder = builder.with_watchlist(Arc::new(MemoryWatchlist::default()));
                    }
                    builder = builder.with_group(*group);
                }
                if watch_at == order.len() {
                    builder = builder.with_watchlist(Arc::new(MemoryWatchlist::default()));
                }
                let schema = builder.build();
                assert!(schema.is_ok(), "rotation {shift}, watchlist at {watch_at}");
                let schema = schema.unwrap();
                assert_eq!(sorted(schema.query_fields()), expected_queries);
                assert_eq!(sorted(schema.mutation_fields()), expected_mutations);
            }
        }
    }

    #[test]
    fn test_sdl_lists_connections() {
        let schema = SchemaBuilder::new(storage()).with_core_queries().build().unwrap();
        let sdl = schema.sdl();
        assert!(sdl.contains("type BlockConnection"));
        assert!(sdl.contains("type PageInfo"));
        assert!(sdl.contains("latestBlocks"));
    }
}
