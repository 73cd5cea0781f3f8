//! Receipt and share-text templates.
//!
//! Receipts are fixed-width plain text for thermal printers: no line is ever
//! wider than [`ReceiptStyle::width`] characters. Share texts are meant for
//! messaging apps and use `*bold*` markup instead of columns.

use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::warn;

use crate::model::{Billing, Customer, DebtPayment, Equipment};
use crate::money::{Locale, Money};
use crate::pix::PixPayload;
use crate::validation::normalize_phone;

/// Smallest supported paper width in characters.
pub const MIN_WIDTH: usize = 24;

/// Largest supported paper width in characters.
pub const MAX_WIDTH: usize = 64;

/// Billings listed on a statement.
const STATEMENT_BILLINGS: usize = 10;

/// Characters left as they are in a share link query.
const QUERY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Layout and business details printed on every receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptStyle {
    /// Paper width in characters.
    pub width: usize,
    /// Printed at the top.
    pub company_name: String,
    /// Printed under the company name.
    pub phone: Option<String>,
    /// Printed at the bottom.
    pub footer: Option<String>,
    /// Number and date formatting.
    pub locale: Locale,
    /// Receiver details for a payment code; the amount is filled per receipt.
    pub pix: Option<PixPayload>,
}

impl Default for ReceiptStyle {
    fn default() -> Self {
        Self {
            width: 32,
            company_name: String::new(),
            phone: None,
            footer: None,
            locale: Locale::default(),
            pix: None,
        }
    }
}

impl ReceiptStyle {
    /// Width clamped to the supported range.
    #[must_use]
    pub fn effective_width(&self) -> usize {
        self.width.clamp(MIN_WIDTH, MAX_WIDTH)
    }

    fn money(&self, amount: Money) -> String {
        amount.format(self.locale)
    }

    fn date(&self, date: DateTime<Utc>) -> String {
        let pattern = match self.locale {
            Locale::PtBr => "%d/%m/%Y %H:%M",
            Locale::EnUs => "%m/%d/%Y %H:%M",
        };
        date.format(pattern).to_string()
    }

    /// Payment code for `amount`, if a PIX key is configured.
    fn pix_code(&self, amount: Money, reference: &str) -> Option<String> {
        let template = self.pix.as_ref()?;
        if !amount.is_positive() {
            return None;
        }
        match template
            .clone()
            .with_amount(amount)
            .with_txid(reference)
            .encode()
        {
            Ok(code) => Some(code),
            Err(e) => {
                warn!("skipping PIX code: {e}");
                None
            }
        }
    }
}

/// Line builder that keeps every line within the width.
struct Lines {
    width: usize,
    out: Vec<String>,
}

impl Lines {
    fn new(style: &ReceiptStyle) -> Self {
        Self {
            width: style.effective_width(),
            out: Vec::new(),
        }
    }

    fn text(&mut self, text: &str) {
        self.out.extend(wrap(text, self.width));
    }

    fn center(&mut self, text: &str) {
        for line in wrap(text, self.width) {
            let pad = (self.width - line.chars().count()) / 2;
            self.out.push(format!("{}{line}", " ".repeat(pad)));
        }
    }

    /// Label on the left, value on the right.
    fn pair(&mut self, label: &str, value: &str) {
        let used = label.chars().count() + value.chars().count();
        if used < self.width {
            let gap = self.width - used;
            self.out.push(format!("{label}{}{value}", " ".repeat(gap)));
        } else {
            self.text(label);
            for line in wrap(value, self.width) {
                let pad = self.width - line.chars().count();
                self.out.push(format!("{}{line}", " ".repeat(pad)));
            }
        }
    }

    fn rule(&mut self, ch: char) {
        self.out.push(ch.to_string().repeat(self.width));
    }

    fn blank(&mut self) {
        self.out.push(String::new());
    }

    fn header(&mut self, style: &ReceiptStyle, title: &str) {
        if !style.company_name.trim().is_empty() {
            self.center(&style.company_name);
        }
        if let Some(phone) = style.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            self.center(phone);
        }
        self.rule('-');
        self.center(title);
        self.rule('-');
    }

    fn signature(&mut self, caption: &str) {
        self.blank();
        self.blank();
        self.rule('_');
        self.center(caption);
    }

    fn pix(&mut self, code: Option<String>) {
        if let Some(code) = code {
            self.rule('-');
            self.text("PIX copia e cola:");
            self.text(&code);
        }
    }

    fn footer(&mut self, style: &ReceiptStyle) {
        if let Some(footer) = style.footer.as_deref().filter(|f| !f.trim().is_empty()) {
            self.blank();
            self.center(footer);
        }
    }

    fn finish(self) -> String {
        let mut text = self.out.join("\n");
        text.push('\n');
        text
    }
}

/// Word-wrap `text` to `width` characters, splitting words that do not fit.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            let line_len = line.chars().count();
            if line_len > 0 && line_len + 1 + word.len() <= width {
                line.push(' ');
                line.extend(word.iter());
                continue;
            }
            if line_len > 0 {
                lines.push(std::mem::take(&mut line));
            }
            while word.len() > width {
                lines.push(word.drain(..width).collect());
            }
            line.extend(word.iter());
        }
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn equipment_label(number: &str, equipment: Option<&Equipment>) -> String {
    match equipment {
        Some(e) => format!("{number} ({})", e.kind.label()),
        None => number.to_string(),
    }
}

/// Receipt handed over at a visit ("acerto de contas").
#[must_use]
pub fn billing_receipt(
    billing: &Billing,
    customer: &Customer,
    equipment: Option<&Equipment>,
    style: &ReceiptStyle,
) -> String {
    let b = &billing.breakdown;
    let input = &billing.input;
    let mut lines = Lines::new(style);

    lines.header(style, "ACERTO DE CONTAS");
    lines.pair("Data:", &style.date(billing.date));
    lines.text(&format!("Cliente: {}", customer.name));
    lines.text(&format!(
        "Máquina: {}",
        equipment_label(&billing.equipment_number, equipment)
    ));
    lines.rule('-');

    lines.pair("Leitura anterior", &input.previous_reading.to_string());
    lines.pair("Leitura atual", &input.current_reading.to_string());
    if input.meter_reset {
        lines.text("(contador zerado)");
    }
    lines.pair("Jogadas", &b.plays.to_string());
    lines.pair("Valor bruto", &style.money(b.gross));
    if b.discount.is_positive() {
        lines.pair("Desconto", &format!("-{}", style.money(b.discount)));
        lines.pair("Valor líquido", &style.money(b.net));
    }
    let customer_percent = input.customer_percent;
    lines.pair(
        &format!("Cliente ({})", customer_percent.format(style.locale)),
        &style.money(b.customer_share),
    );
    lines.pair(
        &format!("Empresa ({})", customer_percent.complement().format(style.locale)),
        &style.money(b.house_share),
    );
    if b.previous_debt.is_positive() {
        lines.pair("Débito anterior", &style.money(b.previous_debt));
    }
    lines.rule('=');
    lines.pair("TOTAL A PAGAR", &style.money(b.amount_due));
    lines.pair("Valor pago", &style.money(b.amount_paid));
    if b.change.is_positive() {
        lines.pair("Troco", &style.money(b.change));
    }
    lines.pair("Saldo devedor", &style.money(b.new_debt));

    if let Some(notes) = billing.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        lines.rule('-');
        lines.text(&format!("Obs: {notes}"));
    }

    lines.signature("Assinatura do cliente");
    lines.pix(style.pix_code(b.new_debt, &billing.id));
    lines.footer(style);
    lines.finish()
}

/// Receipt for a payment against a customer's debt.
#[must_use]
pub fn debt_payment_receipt(payment: &DebtPayment, customer: &Customer, style: &ReceiptStyle) -> String {
    let mut lines = Lines::new(style);

    lines.header(style, "RECIBO DE PAGAMENTO");
    lines.pair("Data:", &style.date(payment.date));
    lines.text(&format!("Cliente: {}", customer.name));
    lines.pair("Forma:", payment.method.label());
    lines.rule('-');
    lines.pair("Débito anterior", &style.money(payment.debt_before));
    lines.pair("Valor pago", &style.money(payment.amount));
    lines.rule('=');
    lines.pair("Saldo devedor", &style.money(payment.debt_after()));

    if let Some(notes) = payment.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        lines.rule('-');
        lines.text(&format!("Obs: {notes}"));
    }

    lines.signature("Assinatura");
    lines.footer(style);
    lines.finish()
}

/// Statement of a customer's open debt and latest visits.
///
/// `billings` are listed newest first, at most ten.
#[must_use]
pub fn customer_statement(
    customer: &Customer,
    billings: &[&Billing],
    payments: &[&DebtPayment],
    style: &ReceiptStyle,
) -> String {
    let mut lines = Lines::new(style);

    lines.header(style, "EXTRATO");
    lines.text(&format!("Cliente: {}", customer.name));
    if let Some(address) = customer.address.as_deref() {
        lines.text(address);
    }
    lines.rule('-');

    let mut recent: Vec<&Billing> = billings.to_vec();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    if recent.is_empty() {
        lines.text("Nenhum acerto registrado.");
    }
    for billing in recent.iter().take(STATEMENT_BILLINGS) {
        lines.text(&format!(
            "{} {}",
            style.date(billing.date),
            billing.equipment_number
        ));
        lines.pair("  Total", &style.money(billing.breakdown.amount_due));
        lines.pair("  Pago", &style.money(billing.breakdown.amount_paid));
    }

    if !payments.is_empty() {
        lines.rule('-');
        lines.text("Pagamentos:");
        let mut payments: Vec<&DebtPayment> = payments.to_vec();
        payments.sort_by(|a, b| b.date.cmp(&a.date));
        for payment in payments.iter().take(STATEMENT_BILLINGS) {
            lines.pair(
                &format!("  {}", style.date(payment.date)),
                &style.money(payment.amount),
            );
        }
    }

    lines.rule('=');
    lines.pair("Saldo devedor", &style.money(customer.debt));
    lines.pix(style.pix_code(customer.debt, &customer.id));
    lines.footer(style);
    lines.finish()
}

/// Visit summary for a messaging app.
#[must_use]
pub fn billing_share_text(
    billing: &Billing,
    customer: &Customer,
    equipment: Option<&Equipment>,
    style: &ReceiptStyle,
) -> String {
    let b = &billing.breakdown;
    let mut out = vec!["*ACERTO DE CONTAS*".to_string()];
    if !style.company_name.trim().is_empty() {
        out.push(format!("*{}*", style.company_name.trim()));
    }
    out.push(format!("Data: {}", style.date(billing.date)));
    out.push(format!("Cliente: {}", customer.name));
    out.push(format!(
        "Máquina: {}",
        equipment_label(&billing.equipment_number, equipment)
    ));
    out.push(format!("Jogadas: {}", b.plays));
    out.push(format!("Valor bruto: {}", style.money(b.gross)));
    if b.discount.is_positive() {
        out.push(format!("Desconto: -{}", style.money(b.discount)));
    }
    out.push(format!("Parte do cliente: {}", style.money(b.customer_share)));
    if b.previous_debt.is_positive() {
        out.push(format!("Débito anterior: {}", style.money(b.previous_debt)));
    }
    out.push(format!("*Total a pagar: {}*", style.money(b.amount_due)));
    out.push(format!("Valor pago: {}", style.money(b.amount_paid)));
    out.push(format!("*Saldo devedor: {}*", style.money(b.new_debt)));
    push_share_tail(&mut out, style, style.pix_code(b.new_debt, &billing.id));
    out.join("\n")
}

/// Payment confirmation for a messaging app.
#[must_use]
pub fn payment_share_text(payment: &DebtPayment, customer: &Customer, style: &ReceiptStyle) -> String {
    let mut out = vec!["*RECIBO DE PAGAMENTO*".to_string()];
    if !style.company_name.trim().is_empty() {
        out.push(format!("*{}*", style.company_name.trim()));
    }
    out.push(format!("Data: {}", style.date(payment.date)));
    out.push(format!("Cliente: {}", customer.name));
    out.push(format!(
        "Valor pago: {} ({})",
        style.money(payment.amount),
        payment.method.label()
    ));
    out.push(format!("*Saldo devedor: {}*", style.money(payment.debt_after())));
    push_share_tail(&mut out, style, None);
    out.join("\n")
}

fn push_share_tail(out: &mut Vec<String>, style: &ReceiptStyle, pix: Option<String>) {
    if let Some(code) = pix {
        out.push(String::new());
        out.push("PIX copia e cola:".to_string());
        out.push(code);
    }
    if let Some(footer) = style.footer.as_deref().filter(|f| !f.trim().is_empty()) {
        out.push(String::new());
        out.push(footer.trim().to_string());
    }
}

/// Link that opens a chat with `phone` and `text` typed in.
///
/// Numbers with 10 or 11 digits are taken as Brazilian and get the `55`
/// country code.
#[must_use]
pub fn whatsapp_link(phone: &str, text: &str) -> String {
    let mut digits = normalize_phone(phone);
    if matches!(digits.len(), 10 | 11) {
        digits.insert_str(0, "55");
    }
    format!("https://wa.me/{digits}?text={}", utf8_percent_encode(text, QUERY))
}
