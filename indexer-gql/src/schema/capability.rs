// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use super::error::QueryError;
use crate::storage::AddressActivityReader;
use crate::storage::Capability;
use crate::storage::SetCodeAuthorizationReader;
use crate::storage::Storage;
use crate::storage::TokenHolderReader;

pub fn require_address_activity(
    storage: &dyn Storage,
) -> Result<&dyn AddressActivityReader, QueryError> {
    storage.address_activity().ok_or(QueryError::Unsupported(Capability::AddressActivity))
}

pub fn require_set_code_authorizations(
    storage: &dyn Storage,
) -> Result<&dyn SetCodeAuthorizationReader, QueryError> {
    storage
        .set_code_authorizations()
        .ok_or(QueryError::Unsupported(Capability::SetCodeAuthorizations))
}

pub fn require_token_holders(storage: &dyn Storage) -> Result<&dyn TokenHolderReader, QueryError> {
    storage.token_holders().ok_or(QueryError::Unsupported(Capability::TokenHolders))
}

pub fn detect(storage: &dyn Storage) -> Vec<Capability> {
    Capability::ALL.into_iter().filter(|capability| capability.is_provided_by(storage)).collect()
}
