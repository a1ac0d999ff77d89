//! Github Gist parsing used by the easy oracle.

use crate::chain::types::AccountId;
use crate::contracts::messages::ContractError;

const GIST_PREFIX: &str = "https://gist.githubusercontent.com/";
const CLAIM_PREFIX: &str = "This gist is owned by address: 0x";
const ADDRESS_LEN: usize = 64;

/// Components of a raw Gist file url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GistUrl {
    pub username: String,
    pub gist_id: String,
    pub filename: String,
}

/// Parses a raw Github Gist url.
pub fn parse_gist_url(url: &str) -> Result<GistUrl, ContractError> {
    let path = url
        .strip_prefix(GIST_PREFIX)
        .ok_or(ContractError::InvalidUrl)?;
    let components: Vec<_> = path.split('/').collect();
    if components.len() < 5 {
        return Err(ContractError::InvalidUrl);
    }
    Ok(GistUrl {
        username: components[0].to_string(),
        gist_id: components[1].to_string(),
        filename: components[4].to_string(),
    })
}

/// Extracts the owner account from a claim in the gist body.
///
/// The body must contain "This gist is owned by address: 0x" followed by the
/// 256-bit account id in hex.
pub fn extract_claim(body: &[u8]) -> Result<AccountId, ContractError> {
    let body = String::from_utf8_lossy(body);
    let pos = body.find(CLAIM_PREFIX).ok_or(ContractError::NoClaimFound)?;
    let addr: String = body[pos + CLAIM_PREFIX.len()..]
        .chars()
        .take(ADDRESS_LEN)
        .collect();
    decode_account_id(addr.as_bytes())
}

/// Decodes a hex string as a 256-bit account id.
fn decode_account_id(addr: &[u8]) -> Result<AccountId, ContractError> {
    if addr.len() != ADDRESS_LEN {
        return Err(ContractError::InvalidAddressLength);
    }
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(addr, &mut bytes).map_err(|_| ContractError::InvalidAddress)?;
    Ok(AccountId::new(bytes))
}

/// Renders the claim line a gist must contain to attest `account`.
pub fn claim_for(account: &AccountId) -> String {
    format!("{}{}", CLAIM_PREFIX, hex::encode(account.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_parse_gist_url() {
        let result = parse_gist_url("https://gist.githubusercontent.com/h4x3rotab/0cabeb528bdaf30e4cf741e26b714e04/raw/620f958fb92baba585a77c1854d68dc986803b4e/test%2520gist");
        assert_eq!(
            result,
            Ok(GistUrl {
                username: "h4x3rotab".to_string(),
                gist_id: "0cabeb528bdaf30e4cf741e26b714e04".to_string(),
                filename: "test%2520gist".to_string(),
            })
        );
        assert_eq!(
            parse_gist_url("http://example.com"),
            Err(ContractError::InvalidUrl)
        );
        assert_eq!(
            parse_gist_url("https://gist.githubusercontent.com/user/id"),
            Err(ContractError::InvalidUrl)
        );
    }

    #[test]
    fn can_decode_claim() {
        let ok = extract_claim(b"...This gist is owned by address: 0x0123456789012345678901234567890123456789012345678901234567890123...");
        assert_eq!(
            ok,
            decode_account_id(b"0123456789012345678901234567890123456789012345678901234567890123")
        );
        assert!(ok.is_ok());

        assert_eq!(
            extract_claim(b"This gist is owned by"),
            Err(ContractError::NoClaimFound)
        );
        assert_eq!(
            extract_claim(b"This gist is owned by address: 0xAB"),
            Err(ContractError::InvalidAddressLength)
        );
        assert_eq!(
            extract_claim(b"This gist is owned by address: 0xXX23456789012345678901234567890123456789012345678901234567890123"),
            Err(ContractError::InvalidAddress)
        );
    }

    #[test]
    fn claim_roundtrip() {
        let account = AccountId::new([0x01; 32]);
        let body = format!("hello\n{}\n", claim_for(&account));
        assert_eq!(extract_claim(body.as_bytes()), Ok(account));
    }
}
