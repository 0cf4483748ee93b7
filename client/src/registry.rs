//! Jar discovery: enumerate every jar the factory has deployed and hydrate
//! its display fields.
//!
//! Each field is its own `eth_call` against the latest block. There is no
//! cross-read snapshot, so a chain reorganization between reads can surface
//! a mixed view of one jar; at a handful of jars this window is tiny and the
//! listing is simply re-fetched by the caller. The fan-out is all-or-nothing:
//! if any single read fails, the whole listing fails rather than returning a
//! partial batch.

use futures::future::try_join_all;
use futures::try_join;
use tracing::debug;

use crate::abi;
use crate::config::ClientConfig;
use crate::errors::{ClientError, FailureKind, Result};
use crate::types::{Address, Jar};
use crate::wallet::WalletSession;

const TOTAL_JARS_SIG: &str = "getTotalJars()";
const ALL_JARS_SIG: &str = "getAllHODLJars()";

/// Result of [`JarRegistryClient::list_jars`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct JarListOutcome {
    pub success: bool,
    pub message: String,
    pub failure: Option<FailureKind>,
    pub jars: Vec<Jar>,
}

impl JarListOutcome {
    fn failure(err: ClientError) -> Self {
        JarListOutcome {
            success: false,
            message: format!("Error fetching HODL jars: {err}"),
            failure: Some(err.kind()),
            jars: Vec::new(),
        }
    }
}

/// Read-only client over the jar factory and the jars it deployed.
pub struct JarRegistryClient {
    config: ClientConfig,
}

impl JarRegistryClient {
    pub fn new(config: ClientConfig) -> Self {
        JarRegistryClient { config }
    }

    /// List every registered jar with its display fields.
    ///
    /// Zero registered jars is a successful, empty listing — never an error.
    pub async fn list_jars(&self, session: &WalletSession) -> JarListOutcome {
        match self.try_list(session).await {
            Ok(outcome) => outcome,
            Err(err) => JarListOutcome::failure(err),
        }
    }

    async fn try_list(&self, session: &WalletSession) -> Result<JarListOutcome> {
        let total = self
            .read_uint(session, self.config.factory, TOTAL_JARS_SIG)
            .await?;
        if total == 0 {
            return Ok(JarListOutcome {
                success: true,
                message: "No jars have been created yet.".to_string(),
                failure: None,
                jars: Vec::new(),
            });
        }

        let raw = session
            .call(self.config.factory, &abi::encode_call(ALL_JARS_SIG, &[]))
            .await?;
        let addresses = abi::decode_address_array(&raw)?;
        debug!(count = addresses.len(), "hydrating jars");

        let jars = try_join_all(
            addresses
                .into_iter()
                .map(|address| self.hydrate(session, address)),
        )
        .await?;

        Ok(JarListOutcome {
            success: true,
            message: format!("Found {} HODL jars", jars.len()),
            failure: None,
            jars,
        })
    }

    /// Fetch the six display fields of one jar, concurrently.
    async fn hydrate(&self, session: &WalletSession, address: Address) -> Result<Jar> {
        let (kid_name, image_url, story, age, foster_home, donor) = try_join!(
            self.read_string(session, address, "kidname()"),
            self.read_string(session, address, "imageurl()"),
            self.read_string(session, address, "story()"),
            self.read_age(session, address),
            self.read_address(session, address, "fosterHome()"),
            self.read_address(session, address, "donor()"),
        )?;

        Ok(Jar {
            address,
            kid_name,
            image_url,
            story,
            age,
            foster_home,
            // The zero address means the jar is still waiting for its donor.
            donor: (!donor.is_zero()).then_some(donor),
        })
    }

    async fn read_uint(
        &self,
        session: &WalletSession,
        to: Address,
        signature: &str,
    ) -> Result<u128> {
        let raw = session.call(to, &abi::encode_call(signature, &[])).await?;
        abi::decode_uint(&raw)
    }

    async fn read_string(
        &self,
        session: &WalletSession,
        to: Address,
        signature: &str,
    ) -> Result<String> {
        let raw = session.call(to, &abi::encode_call(signature, &[])).await?;
        abi::decode_string(&raw)
    }

    async fn read_address(
        &self,
        session: &WalletSession,
        to: Address,
        signature: &str,
    ) -> Result<Address> {
        let raw = session.call(to, &abi::encode_call(signature, &[])).await?;
        abi::decode_address(&raw)
    }

    async fn read_age(&self, session: &WalletSession, address: Address) -> Result<u8> {
        let value = self.read_uint(session, address, "age()").await?;
        u8::try_from(value)
            .map_err(|_| ClientError::Codec(format!("Jar age {value} is out of range")))
    }
}
