use bitcoin::absolute::LockTime;
use bitcoin::script::ScriptBuf;
use bitcoin::transaction::Version;
use bitcoin::{Amount, Sequence, Transaction, TxIn, TxOut, Witness};

use crate::address::output_script;
use crate::amount::{change_for, checked_total};
use crate::error::BtcError;
use crate::network::BtcNetwork;
use crate::utxo::Utxo;

/// Estimated virtual size of a P2WPKH input (in vbytes).
/// Breakdown: 41 bytes non-witness + ~27 witness bytes / 4 = ~68 vbytes per input.
const P2WPKH_INPUT_VBYTES: u64 = 68;

/// Estimated virtual size of any output (in vbytes).
const OUTPUT_VBYTES: u64 = 31;

/// Fixed transaction overhead (in vbytes): version, lock time, segwit
/// marker/flag and the input/output counts, rounded down.
const TX_OVERHEAD_VBYTES: u64 = 10;

/// An unsigned Bitcoin transaction ready for signing.
#[derive(Debug, Clone)]
pub struct UnsignedBtcTx {
    /// The bitcoin transaction with empty witnesses.
    pub tx: Transaction,
    /// The UTXOs being spent (in the same order as the transaction inputs).
    /// Needed for computing sighashes during signing.
    pub prevouts: Vec<TxOut>,
}

impl UnsignedBtcTx {
    /// Sum of the values being spent.
    pub fn input_total_sat(&self) -> Result<u64, BtcError> {
        checked_total(self.prevouts.iter().map(|p| p.value.to_sat()))
    }

    /// Sum of the values being paid out, change included.
    pub fn output_total_sat(&self) -> Result<u64, BtcError> {
        checked_total(self.tx.output.iter().map(|o| o.value.to_sat()))
    }

    /// The fee this transaction pays: inputs minus outputs.
    pub fn fee_sat(&self) -> Result<u64, BtcError> {
        self.input_total_sat()?
            .checked_sub(self.output_total_sat()?)
            .ok_or(BtcError::ValueOverflow)
    }

    /// The change output, if any. Always the second output.
    pub fn change_output(&self) -> Option<&TxOut> {
        self.tx.output.get(1)
    }
}

/// Estimate the virtual size of a transaction spending only P2WPKH inputs.
///
/// Informational only: the send pipeline charges the caller's flat fee. There
/// is no legacy-input variant since the wallet never owns legacy outputs.
pub fn estimate_vsize(num_inputs: usize, num_outputs: usize) -> u64 {
    TX_OVERHEAD_VBYTES
        + (num_inputs as u64 * P2WPKH_INPUT_VBYTES)
        + (num_outputs as u64 * OUTPUT_VBYTES)
}

/// Build an unsigned P2WPKH Bitcoin transaction.
///
/// Every supplied UTXO is spent, in order. The recipient receives exactly
/// `amount_sat`, `fee_sat` is left to the miner and whatever remains goes back
/// to `change_address`. No change output is created when nothing remains.
pub fn build_p2wpkh_transaction(
    utxos: &[Utxo],
    recipient: &str,
    amount_sat: u64,
    fee_sat: u64,
    change_address: &str,
    network: BtcNetwork,
) -> Result<UnsignedBtcTx, BtcError> {
    let recipient_script = output_script(recipient, network)?;
    let change_script = output_script(change_address, network)?;

    if utxos.is_empty() {
        return Err(BtcError::NoSpendableOutputs(change_address.to_string()));
    }

    let total_sat = checked_total(utxos.iter().map(|u| u.value_sat))?;
    let change_sat = change_for(total_sat, amount_sat, fee_sat)?;

    let mut inputs = Vec::with_capacity(utxos.len());
    let mut prevouts = Vec::with_capacity(utxos.len());

    for utxo in utxos {
        inputs.push(TxIn {
            previous_output: utxo.outpoint(),
            script_sig: ScriptBuf::new(), // Empty for segwit.
            sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
            witness: Witness::default(),
        });

        prevouts.push(TxOut {
            value: Amount::from_sat(utxo.value_sat),
            script_pubkey: utxo.script_pubkey.clone(),
        });
    }

    let mut outputs = vec![TxOut {
        value: Amount::from_sat(amount_sat),
        script_pubkey: recipient_script,
    }];
    if change_sat > 0 {
        outputs.push(TxOut {
            value: Amount::from_sat(change_sat),
            script_pubkey: change_script,
        });
    }

    tracing::debug!(
        %network,
        inputs = inputs.len(),
        total_sat,
        amount_sat,
        fee_sat,
        change_sat,
        "built unsigned transaction"
    );

    let tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: inputs,
        output: outputs,
    };

    Ok(UnsignedBtcTx { tx, prevouts })
}
