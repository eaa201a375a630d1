use crate::entity::{Entity, EntityMetadata, Lineage};
use crate::errors::RepoResult;

/// Resolves the collection name for an entity type.
///
/// Precedence: construction-time override, then the type-level declaration, then the
/// type name. The result is always lower-cased. Lineage plays no part here; derived types
/// are stored under their own name.
pub fn resolve_collection_name(
    entity_name: &str,
    declarations: &EntityMetadata,
    overrides: Option<&EntityMetadata>,
) -> String {
    if let Some(name) = overrides.and_then(|o| o.get_collection_name()) {
        return name.name().to_lowercase();
    }

    let name = declarations
        .get_collection_name()
        .map(|n| n.name())
        .unwrap_or(entity_name);

    if name.trim().is_empty() {
        entity_name.to_lowercase()
    } else {
        name.to_lowercase()
    }
}

/// Resolves the connection name for an entity type.
///
/// Same precedence as [`resolve_collection_name`], except that a derived type without a
/// declaration takes the name of the ancestor directly built on the base.
pub fn resolve_connection_name(
    entity_name: &str,
    lineage: Lineage,
    declarations: &EntityMetadata,
    overrides: Option<&EntityMetadata>,
) -> String {
    if let Some(name) = overrides.and_then(|o| o.get_connection_name()) {
        return name.name().to_lowercase();
    }

    let declared = declarations.get_connection_name().map(|n| n.name());
    let name = match (declared, lineage) {
        (Some(declared), _) => declared,
        (None, Lineage::Direct) => entity_name,
        (None, Lineage::Derived(ancestors)) => ancestors.last().copied().unwrap_or(entity_name),
    };

    if name.trim().is_empty() {
        entity_name.to_lowercase()
    } else {
        name.to_lowercase()
    }
}

/// Collection and connection names resolved for an entity type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedNames {
    pub collection_name: String,
    pub connection_name: String,
}

impl ResolvedNames {
    /// Resolves both names for `T`. Fails only if `T`'s declarations are invalid.
    pub fn resolve<T: Entity>(overrides: Option<&EntityMetadata>) -> RepoResult<ResolvedNames> {
        let declarations = T::declarations()?;
        let lineage = T::lineage();
        let entity_name = T::entity_name();

        let names = ResolvedNames {
            collection_name: resolve_collection_name(entity_name, &declarations, overrides),
            connection_name: resolve_connection_name(entity_name, lineage, &declarations, overrides),
        };
        log::debug!(
            "Resolved {} to collection '{}' on connection '{}'",
            entity_name,
            names.collection_name,
            names.connection_name
        );
        Ok(names)
    }
}
