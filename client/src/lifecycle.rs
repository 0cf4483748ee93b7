//! Jar mutations: create a jar, donate into one, withdraw from one.
//!
//! Creation races the wallet's acceptance of the submission against a fixed
//! window; whichever settles first decides the outcome. A submission that
//! loses the race is not cancelled — it keeps running in the background and
//! its eventual settlement is logged, but the attempt is already reported
//! failed even if the transaction lands later.
//!
//! Donation is strictly two-phase: the USDC approval must be confirmed
//! on-chain before the deposit is submitted. The phases are not atomic; a
//! failure after the approval confirms leaves the allowance outstanding,
//! which is logged and left for the user to retry from.

use tokio::time::sleep;
use tracing::{info, warn};

use crate::abi::{self, AbiValue};
use crate::amount::TokenAmount;
use crate::config::ClientConfig;
use crate::errors::{ClientError, FailureKind, Result};
use crate::events::{self, ChainEvent};
use crate::types::{Address, TxHash, TxReceipt};
use crate::wallet::WalletSession;

const CREATE_JAR_SIG: &str = "createHODLJar(string,string,string,uint256,address)";
const APPROVE_SIG: &str = "approve(address,uint256)";
const DONATE_SIG: &str = "donate(uint256)";
const WITHDRAW_SIG: &str = "withdraw(uint256)";

/// Parameters for a new jar, as entered by the user.
#[derive(Debug, Clone)]
pub struct CreateJarRequest {
    pub name: String,
    pub story: String,
    /// Absent means the jar is created with an empty image URL.
    pub image_url: Option<String>,
    pub age: u8,
    /// Custodian account, as typed; parsed and validated before submission.
    pub foster_home: String,
}

/// Result of [`JarLifecycleClient::create_jar`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct CreateJarOutcome {
    pub success: bool,
    pub message: String,
    pub failure: Option<FailureKind>,
    /// Factory transaction hash, present once submission was accepted.
    pub tx_hash: Option<TxHash>,
}

impl CreateJarOutcome {
    fn failure(err: ClientError, tx_hash: Option<TxHash>) -> Self {
        let message = match &err {
            ClientError::Validation(m) => m.clone(),
            other => format!("Error creating HODL Jar: {other}"),
        };
        CreateJarOutcome {
            success: false,
            message,
            failure: Some(err.kind()),
            tx_hash,
        }
    }
}

/// Result of [`JarLifecycleClient::donate`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct DonationOutcome {
    pub success: bool,
    pub message: String,
    pub failure: Option<FailureKind>,
    /// USDC approval transaction hash (phase one).
    pub approval_tx: Option<TxHash>,
    /// Jar deposit transaction hash (phase two).
    pub donation_tx: Option<TxHash>,
}

impl DonationOutcome {
    fn failure(err: ClientError, approval_tx: Option<TxHash>, donation_tx: Option<TxHash>) -> Self {
        let message = match &err {
            ClientError::Validation(m) => m.clone(),
            other => format!("Failed to donate to HODL jar: {other}"),
        };
        DonationOutcome {
            success: false,
            message,
            failure: Some(err.kind()),
            approval_tx,
            donation_tx,
        }
    }
}

/// Result of [`JarLifecycleClient::withdraw`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct WithdrawalOutcome {
    pub success: bool,
    pub message: String,
    pub failure: Option<FailureKind>,
    pub tx_hash: Option<TxHash>,
}

impl WithdrawalOutcome {
    fn failure(err: ClientError, tx_hash: Option<TxHash>) -> Self {
        let message = match &err {
            ClientError::Validation(m) => m.clone(),
            other => format!("Failed to withdraw from HODL jar: {other}"),
        };
        WithdrawalOutcome {
            success: false,
            message,
            failure: Some(err.kind()),
            tx_hash,
        }
    }
}

/// Client for the write path of the jar system.
pub struct JarLifecycleClient {
    config: ClientConfig,
}

impl JarLifecycleClient {
    pub fn new(config: ClientConfig) -> Self {
        JarLifecycleClient { config }
    }

    /// Create a new jar through the factory.
    pub async fn create_jar(
        &self,
        session: &WalletSession,
        request: CreateJarRequest,
    ) -> CreateJarOutcome {
        let custodian = match validate_create(&request) {
            Ok(address) => address,
            Err(err) => return CreateJarOutcome::failure(err, None),
        };

        let calldata = abi::encode_call(
            CREATE_JAR_SIG,
            &[
                AbiValue::Str(request.name.clone()),
                AbiValue::Str(request.image_url.clone().unwrap_or_default()),
                AbiValue::Str(request.story.clone()),
                AbiValue::Uint(u128::from(request.age)),
                AbiValue::Address(custodian),
            ],
        );

        info!(name = %request.name, age = request.age, custodian = %custodian, "creating HODL jar");
        let hash = match self.race_submission(session, self.config.factory, calldata).await {
            Ok(hash) => hash,
            Err(err) => return CreateJarOutcome::failure(err, None),
        };
        info!(tx = %hash, "factory transaction initiated");

        let receipt = match self.confirm(session, hash).await {
            Ok(receipt) => receipt,
            Err(err) => return CreateJarOutcome::failure(err, Some(hash)),
        };

        if receipt.succeeded() {
            CreateJarOutcome {
                success: true,
                message: "HODL Jar created successfully!".to_string(),
                failure: None,
                tx_hash: Some(hash),
            }
        } else {
            CreateJarOutcome {
                success: false,
                message: "Creation failed. Please try again.".to_string(),
                failure: Some(FailureKind::Reverted),
                tx_hash: Some(hash),
            }
        }
    }

    /// Donate `amount` USDC to the jar at `jar`.
    pub async fn donate(&self, session: &WalletSession, jar: &str, amount: &str) -> DonationOutcome {
        let (jar_address, units) = match validate_transfer_input(jar, amount, "donation") {
            Ok(parsed) => parsed,
            Err(err) => return DonationOutcome::failure(err, None, None),
        };

        // Phase one: approve the jar to pull the donation.
        info!(jar = %jar_address, amount = %units, "approving USDC transfer to the jar");
        let approve_data = abi::encode_call(
            APPROVE_SIG,
            &[
                AbiValue::Address(jar_address),
                AbiValue::Uint(units.base_units()),
            ],
        );
        let approval_tx = match session.send(self.config.token, &approve_data).await {
            Ok(hash) => hash,
            Err(err) => return DonationOutcome::failure(err, None, None),
        };
        let approval_receipt = match self.confirm(session, approval_tx).await {
            Ok(receipt) => receipt,
            Err(err) => return DonationOutcome::failure(err, Some(approval_tx), None),
        };
        if !approval_receipt.succeeded() {
            return DonationOutcome::failure(
                ClientError::Reverted("USDC approval failed".to_string()),
                Some(approval_tx),
                None,
            );
        }

        // Phase two: deposit, only after the approval is included.
        info!(jar = %jar_address, amount = %units, "depositing into the jar");
        let donate_data = abi::encode_call(DONATE_SIG, &[AbiValue::Uint(units.base_units())]);
        let donation_tx = match session.send(jar_address, &donate_data).await {
            Ok(hash) => hash,
            Err(err) => {
                warn_outstanding_allowance(jar_address, units);
                return DonationOutcome::failure(err, Some(approval_tx), None);
            }
        };
        let receipt = match self.confirm(session, donation_tx).await {
            Ok(receipt) => receipt,
            Err(err) => {
                warn_outstanding_allowance(jar_address, units);
                return DonationOutcome::failure(err, Some(approval_tx), Some(donation_tx));
            }
        };
        if !receipt.succeeded() {
            warn_outstanding_allowance(jar_address, units);
            return DonationOutcome::failure(
                ClientError::Reverted("the jar rejected the donation".to_string()),
                Some(approval_tx),
                Some(donation_tx),
            );
        }

        if let Some(ChainEvent::DonationReceived { donor, amount }) =
            events::first_event(&receipt, "DonationReceived")
        {
            info!(jar = %jar_address, donor = %donor, amount, "donation recorded by the jar");
        }

        DonationOutcome {
            success: true,
            message: format!(
                "Successfully donated {} USDC to HODL jar. Transaction hash: {donation_tx}",
                amount.trim()
            ),
            failure: None,
            approval_tx: Some(approval_tx),
            donation_tx: Some(donation_tx),
        }
    }

    /// Withdraw `amount` USDC from the jar at `jar` (custodian only; the
    /// contract enforces authorization).
    pub async fn withdraw(
        &self,
        session: &WalletSession,
        jar: &str,
        amount: &str,
    ) -> WithdrawalOutcome {
        let (jar_address, units) = match validate_transfer_input(jar, amount, "withdrawal") {
            Ok(parsed) => parsed,
            Err(err) => return WithdrawalOutcome::failure(err, None),
        };

        info!(jar = %jar_address, amount = %units, "withdrawing from the jar");
        let calldata = abi::encode_call(WITHDRAW_SIG, &[AbiValue::Uint(units.base_units())]);
        let hash = match session.send(jar_address, &calldata).await {
            Ok(hash) => hash,
            Err(err) => return WithdrawalOutcome::failure(err, None),
        };
        let receipt = match self.confirm(session, hash).await {
            Ok(receipt) => receipt,
            Err(err) => return WithdrawalOutcome::failure(err, Some(hash)),
        };

        if receipt.succeeded() {
            WithdrawalOutcome {
                success: true,
                message: format!(
                    "Successfully withdrew {} USDC from HODL jar. Transaction hash: {hash}",
                    amount.trim()
                ),
                failure: None,
                tx_hash: Some(hash),
            }
        } else {
            WithdrawalOutcome::failure(
                ClientError::Reverted("the jar rejected the withdrawal".to_string()),
                Some(hash),
            )
        }
    }

    /// Submit calldata, racing the wallet's acceptance against the configured
    /// window. First to settle wins; on timeout the submission keeps running
    /// in a background task so its late settlement is observable in the logs.
    async fn race_submission(
        &self,
        session: &WalletSession,
        to: Address,
        calldata: String,
    ) -> Result<TxHash> {
        let mut submit = {
            let session = session.clone();
            tokio::spawn(async move { session.send(to, &calldata).await })
        };

        tokio::select! {
            result = &mut submit => match result {
                Ok(outcome) => outcome,
                Err(err) => Err(ClientError::Wallet(format!("Submission task failed: {err}"))),
            },
            _ = sleep(self.config.submit_timeout) => {
                tokio::spawn(async move {
                    match submit.await {
                        Ok(Ok(hash)) => {
                            warn!(tx = %hash, "submission settled after the timeout window");
                        }
                        Ok(Err(err)) => {
                            warn!(error = %err, "submission failed after the timeout window");
                        }
                        Err(err) => {
                            warn!(error = %err, "submission task died after the timeout window");
                        }
                    }
                });
                Err(ClientError::ConfirmationTimeout(self.config.submit_timeout.as_secs()))
            }
        }
    }

    async fn confirm(&self, session: &WalletSession, hash: TxHash) -> Result<TxReceipt> {
        session
            .wait_for_receipt(
                hash,
                self.config.confirm_timeout,
                self.config.receipt_poll_interval,
            )
            .await
    }
}

fn validate_create(request: &CreateJarRequest) -> Result<Address> {
    if request.name.trim().is_empty()
        || request.story.trim().is_empty()
        || request.foster_home.trim().is_empty()
    {
        return Err(ClientError::Validation(
            "Missing required parameters".to_string(),
        ));
    }
    if request.age == 0 || request.age >= 18 {
        return Err(ClientError::Validation(
            "Age must be between 1 and 17".to_string(),
        ));
    }
    Address::parse(request.foster_home.trim())
}

fn validate_transfer_input(
    jar: &str,
    amount: &str,
    operation: &str,
) -> Result<(Address, TokenAmount)> {
    if jar.trim().is_empty() || amount.trim().is_empty() {
        return Err(ClientError::Validation(format!(
            "Missing required information for {operation}."
        )));
    }
    Ok((Address::parse(jar.trim())?, TokenAmount::parse(amount)?))
}

fn warn_outstanding_allowance(jar: Address, units: TokenAmount) {
    warn!(
        jar = %jar,
        amount = %units,
        "approved allowance left outstanding; the deposit did not commit"
    );
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
