//! Static PIX payment codes ("copia e cola").
//!
//! Builds the EMV merchant-presented payload that banking apps read from a QR
//! code or paste. Rendering the QR image is left to whatever displays it.

use crate::error::{Error, Result};
use crate::money::Money;

/// Globally unique identifier of the PIX arrangement.
const PIX_GUI: &str = "br.gov.bcb.pix";

/// ISO 4217 numeric code for BRL.
const CURRENCY_BRL: &str = "986";

const MAX_NAME_LEN: usize = 25;
const MAX_CITY_LEN: usize = 15;
const MAX_TXID_LEN: usize = 25;

/// Inputs for a static payment code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixPayload {
    /// PIX key: phone, e-mail, CPF/CNPJ or random key.
    pub key: String,
    /// Receiver name as shown by the payer's bank.
    pub merchant_name: String,
    /// Receiver city.
    pub merchant_city: String,
    /// Fixed amount; omitted lets the payer type it.
    pub amount: Option<Money>,
    /// Reference shown on the statement.
    pub txid: Option<String>,
    /// Message to the payer.
    pub description: Option<String>,
}

impl PixPayload {
    /// Create a payload without amount or reference.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        merchant_name: impl Into<String>,
        merchant_city: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            merchant_name: merchant_name.into(),
            merchant_city: merchant_city.into(),
            amount: None,
            txid: None,
            description: None,
        }
    }

    /// Builder: fixed amount.
    #[must_use]
    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Builder: reference id.
    #[must_use]
    pub fn with_txid(mut self, txid: impl Into<String>) -> Self {
        self.txid = Some(txid.into());
        self
    }

    /// Builder: message to the payer.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Encode into the payload string, CRC included.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty key, name or city, or a
    /// non-positive amount.
    pub fn encode(&self) -> Result<String> {
        let key = self.key.trim();
        if key.is_empty() {
            return Err(Error::validation("pix_key", "must not be empty"));
        }
        let name = sanitize(&self.merchant_name, MAX_NAME_LEN);
        if name.is_empty() {
            return Err(Error::validation("merchant_name", "must not be empty"));
        }
        let city = sanitize(&self.merchant_city, MAX_CITY_LEN);
        if city.is_empty() {
            return Err(Error::validation("merchant_city", "must not be empty"));
        }

        let mut account = field("00", PIX_GUI)?;
        account.push_str(&field("01", key)?);
        if let Some(description) = self.description.as_deref() {
            // Field 26 is itself capped at 99 bytes.
            let room = 99usize.saturating_sub(account.len() + 4);
            let description = sanitize(description, room);
            if !description.is_empty() {
                account.push_str(&field("02", &description)?);
            }
        }

        let txid = self
            .txid
            .as_deref()
            .map(sanitize_txid)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "***".to_string());

        let mut payload = field("00", "01")?;
        payload.push_str(&field("26", &account)?);
        payload.push_str(&field("52", "0000")?);
        payload.push_str(&field("53", CURRENCY_BRL)?);
        if let Some(amount) = self.amount {
            if !amount.is_positive() {
                return Err(Error::validation("amount", "must be greater than zero"));
            }
            payload.push_str(&field("54", &amount.to_decimal_string())?);
        }
        payload.push_str(&field("58", "BR")?);
        payload.push_str(&field("59", &name)?);
        payload.push_str(&field("60", &city)?);
        payload.push_str(&field("62", &field("05", &txid)?)?);

        payload.push_str("6304");
        let crc = crc16_ccitt(payload.as_bytes());
        payload.push_str(&format!("{crc:04X}"));
        Ok(payload)
    }
}

/// One TLV field: two-digit id, two-digit length, value.
fn field(id: &str, value: &str) -> Result<String> {
    let len = value.len();
    if len > 99 {
        return Err(Error::validation(
            "pix",
            format!("field {id} is {len} bytes long, limit is 99"),
        ));
    }
    Ok(format!("{id}{len:02}{value}"))
}

/// CRC-16/CCITT-FALSE: polynomial `0x1021`, initial value `0xFFFF`.
#[must_use]
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 == 0 {
                crc << 1
            } else {
                (crc << 1) ^ 0x1021
            };
        }
    }
    crc
}

/// Strip accents, keep printable ASCII, upper-case, and cut to `max` chars.
fn sanitize(value: &str, max: usize) -> String {
    strip_accents(value)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase()
        .chars()
        .take(max)
        .collect::<String>()
        .trim_end()
        .to_string()
}

fn sanitize_txid(value: &str) -> String {
    strip_accents(value)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(MAX_TXID_LEN)
        .collect()
}

/// Replace Portuguese accented letters with their base letter.
#[must_use]
pub fn strip_accents(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'ç' => 'c',
            'Ç' => 'C',
            'ñ' => 'n',
            'Ñ' => 'N',
            other => other,
        })
        .collect()
}
