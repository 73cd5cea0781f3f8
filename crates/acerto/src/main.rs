//! `acerto` - CLI for route collection and billing
//!
//! This binary opens the document store and the local store, loads the
//! account and runs one command against it.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{Local, Utc};
use clap::Parser;
use tracing::warn;

use acerto::billing::{BillingInput, RevenueInput};
use acerto::cli::{
    BillingCommand, BillingEdit, BillingValues, Cli, Command, ConfigCommand, CustomerArgs,
    CustomerCommand, CustomerEdit, DebtCommand, EquipmentCommand, ExpenseCommand, OutputFormat,
    PixCommand, ReportCommand, RouteCommand, WarningCommand,
};
use acerto::model::{
    normalize_number, BillingMode, Customer, Equipment, EquipmentKind, Expense, Route, Warning,
};
use acerto::receipt::{self, ReceiptStyle};
use acerto::report::{Period, Summary};
use acerto::routing::{route_length_km, GeoPoint};
use acerto::store::{DocumentStore, LocalStore, SqliteDocumentStore};
use acerto::{init_logging, AppState, Config, Error, Money, Notice, OfflineQueue, Percent};

type CliResult<T = ()> = anyhow::Result<T>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<Error>() {
                Some(e) => eprintln!("{}", Notice::from_error(e)),
                None => eprintln!("[error] {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult {
    // Load configuration
    let config = Config::load_from(cli.config.clone())?;
    let offline = cli.offline || config.sync.offline;

    if let Command::Config(cmd) = cli.command {
        return handle_config(&config, cmd);
    }

    let docs = Arc::new(
        SqliteDocumentStore::open(config.database_path()).context("opening the document store")?,
    );
    let local = LocalStore::open(config.local_path()).context("opening the local store")?;
    let store: Arc<dyn DocumentStore> = docs.clone();
    let mut state = AppState::new(store, OfflineQueue::open(local), config.database.account.clone());

    if let Command::Sync = cli.command {
        return handle_sync(state).await;
    }

    if offline {
        state = state.offline();
        if !state.load_cached()? {
            warn!("no cached data for account {}", state.account());
        }
    } else if let Err(err) = state.load().await {
        warn!(error = %err, "document store unavailable, working offline");
        state = state.offline();
        state.load_cached()?;
    }

    let mut app = App {
        style: config.receipt_style(),
        config,
        state,
    };

    match cli.command {
        Command::Customer(cmd) => app.customer(cmd).await?,
        Command::Equipment(cmd) => app.equipment(cmd).await?,
        Command::Billing(cmd) => app.billing(cmd).await?,
        Command::Debt(cmd) => app.debt(cmd).await?,
        Command::Expense(cmd) => app.expense(cmd).await?,
        Command::Warning(cmd) => app.warning(cmd).await?,
        Command::Route(cmd) => app.route(cmd).await?,
        Command::Pix(cmd) => app.pix(&cmd)?,
        Command::Report(cmd) => app.report(&cmd)?,
        Command::Status(cmd) => app.status(&docs, cmd.json)?,
        Command::Sync | Command::Config(_) => {}
    }

    app.report_queue()?;
    Ok(())
}

async fn handle_sync(mut state: AppState) -> CliResult {
    state.load_cached()?;
    let report = state
        .set_online(true)
        .await?
        .unwrap_or_default();
    state.load().await?;

    if report.replayed == 0 {
        notify(&Notice::info("nothing to send"));
    } else {
        notify(&Notice::success(format!("sent {} queued change(s)", report.replayed)));
    }
    if report.remaining > 0 {
        notify(&Notice::info(format!("{} change(s) still queued", report.remaining)));
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> CliResult {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Database]");
                println!("  Path:               {}", config.database_path().display());
                println!("  Account:            {}", config.database.account);
                println!("  Local store:        {}", config.local_path().display());
                println!();
                println!("[Business]");
                println!("  Company:            {}", config.business.company_name);
                println!("  Locale:             {}", config.business.locale.tag());
                println!(
                    "  Customer share:     {}",
                    config.default_customer_percent()?.format(config.business.locale)
                );
                println!(
                    "  Price per play:     {}",
                    config.default_price_per_play()?.format(config.business.locale)
                );
                println!();
                println!("[Receipt]");
                println!("  Width:              {}", config.receipt.width);
                println!(
                    "  PIX:                {}",
                    if config.pix_template().is_some() { "enabled" } else { "disabled" }
                );
                println!();
                println!("[Sync]");
                println!("  Offline:            {}", config.sync.offline);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn notify(notice: &Notice) {
    eprintln!("{notice}");
}

#[derive(Debug)]
struct App {
    config: Config,
    style: ReceiptStyle,
    state: AppState,
}

impl App {
    fn money(&self, input: &str) -> acerto::Result<Money> {
        Money::parse(input, self.config.business.locale)
    }

    fn percent(&self, input: &str) -> acerto::Result<Percent> {
        Percent::parse(input, self.config.business.locale)
    }

    fn fmt(&self, amount: Money) -> String {
        amount.format(self.config.business.locale)
    }

    /// Find a customer by id, then by name.
    fn customer_id(&self, key: &str) -> acerto::Result<String> {
        if let Some(customer) = self.state.find::<Customer>(key) {
            return Ok(customer.id.clone());
        }
        let wanted = key.trim().to_lowercase();
        let mut matches = self
            .state
            .customers()
            .iter()
            .filter(|c| c.name.trim().to_lowercase() == wanted);
        match (matches.next(), matches.next()) {
            (Some(customer), None) => Ok(customer.id.clone()),
            (Some(_), Some(_)) => Err(Error::validation(
                "customer",
                format!("more than one customer is named '{key}', use the id"),
            )),
            (None, _) => Err(Error::not_found("customer", key)),
        }
    }

    /// Find equipment by id, then by number.
    fn equipment_id(&self, key: &str) -> acerto::Result<String> {
        if let Some(equipment) = self.state.find::<Equipment>(key) {
            return Ok(equipment.id.clone());
        }
        let wanted = normalize_number(key);
        self.state
            .equipment()
            .iter()
            .find(|e| e.normalized_number() == wanted)
            .map(|e| e.id.clone())
            .ok_or_else(|| Error::not_found("equipment", key))
    }

    /// Find a route by id, then by name.
    fn route_id(&self, key: &str) -> acerto::Result<String> {
        if let Some(route) = self.state.find::<Route>(key) {
            return Ok(route.id.clone());
        }
        let wanted = key.trim().to_lowercase();
        self.state
            .routes()
            .iter()
            .find(|r| r.name.trim().to_lowercase() == wanted)
            .map(|r| r.id.clone())
            .ok_or_else(|| Error::not_found("route", key))
    }

    fn report_queue(&self) -> CliResult {
        if !self.state.is_online() {
            let queued = self.state.queue().len()?;
            if queued > 0 {
                notify(&Notice::info(format!(
                    "offline: {queued} change(s) queued, run `acerto sync` when connected"
                )));
            }
        }
        Ok(())
    }

    async fn customer(&mut self, cmd: CustomerCommand) -> CliResult {
        match cmd {
            CustomerCommand::Add(args) => {
                let customer = new_customer(args);
                let (id, name) = (customer.id.clone(), customer.name.clone());
                self.state.add_customer(customer).await?;
                notify(&Notice::success(format!("customer {name} added ({id})")));
            }
            CustomerCommand::List { debtors, format } => {
                let customers: Vec<&Customer> = self
                    .state
                    .customers()
                    .iter()
                    .filter(|c| !debtors || c.has_debt())
                    .collect();
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&customers)?),
                    OutputFormat::Plain => {
                        for c in customers {
                            let flag = if c.active { "" } else { "  (inactive)" };
                            println!("{}  {:<30} {:>14}{flag}", c.id, c.name, self.fmt(c.debt));
                        }
                    }
                }
            }
            CustomerCommand::Show { customer } => {
                let id = self.customer_id(&customer)?;
                let c = self.state.get::<Customer>(&id)?;
                println!("{} ({})", c.name, c.id);
                if let Some(phone) = &c.phone {
                    println!("  Phone:    {phone}");
                }
                if let Some(address) = &c.address {
                    println!("  Address:  {address}");
                }
                if let Some(city) = &c.city {
                    println!("  City:     {city}");
                }
                println!("  Debt:     {}", self.fmt(c.debt));
                for e in self.state.equipment_at(&id) {
                    println!(
                        "  {} {:<10} reading {}",
                        e.kind.label(),
                        e.number,
                        e.last_reading
                    );
                }
                for w in self.state.warnings().iter().filter(|w| {
                    !w.is_resolved() && w.customer_id.as_deref() == Some(id.as_str())
                }) {
                    println!("  ! {}", w.message);
                }
            }
            CustomerCommand::Edit { customer, details } => {
                let id = self.customer_id(&customer)?;
                let mut updated = self.state.get::<Customer>(&id)?.clone();
                apply_customer_edit(&mut updated, details);
                let name = updated.name.clone();
                self.state.update_customer(updated).await?;
                notify(&Notice::success(format!("customer {name} updated")));
            }
            CustomerCommand::Delete { customer } => {
                let id = self.customer_id(&customer)?;
                let removed = self.state.delete_customer(&id).await?;
                notify(&Notice::success(format!("customer {} deleted", removed.name)));
            }
            CustomerCommand::Statement { customer } => {
                let id = self.customer_id(&customer)?;
                let c = self.state.get::<Customer>(&id)?;
                let billings = self.state.billings_for(&id);
                let mut payments: Vec<_> = self
                    .state
                    .debt_payments()
                    .iter()
                    .filter(|p| p.customer_id == id)
                    .collect();
                payments.sort_by(|a, b| b.date.cmp(&a.date));
                print!("{}", receipt::customer_statement(c, &billings, &payments, &self.style));
            }
        }
        Ok(())
    }

    async fn equipment(&mut self, cmd: EquipmentCommand) -> CliResult {
        match cmd {
            EquipmentCommand::Add {
                number,
                kind,
                price,
                percent,
                customer,
                reading,
            } => {
                let kind: EquipmentKind = kind.into();
                let default_price = self.config.default_price_per_play()?;
                let price = price.map(|p| self.money(&p)).transpose()?;
                let mode = kind.mode_with_price(price, default_price)?;
                let percent = match percent {
                    Some(p) => self.percent(&p)?,
                    None => self.config.default_customer_percent()?,
                };
                let mut equipment =
                    Equipment::new(number, kind, default_price, percent).with_reading(reading);
                equipment.mode = mode;
                if let Some(customer) = customer {
                    equipment = equipment.installed_at(self.customer_id(&customer)?);
                }
                let (id, number) = (equipment.id.clone(), equipment.number.clone());
                self.state.add_equipment(equipment).await?;
                notify(&Notice::success(format!("equipment {number} added ({id})")));
            }
            EquipmentCommand::List { customer, format } => {
                let customer_id = customer.map(|c| self.customer_id(&c)).transpose()?;
                let items: Vec<&Equipment> = self
                    .state
                    .equipment()
                    .iter()
                    .filter(|e| customer_id.is_none() || e.customer_id == customer_id)
                    .collect();
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
                    OutputFormat::Plain => {
                        for e in items {
                            let place = e
                                .customer_id
                                .as_deref()
                                .and_then(|id| self.state.find::<Customer>(id))
                                .map_or("(in stock)", |c| c.name.as_str());
                            println!(
                                "{}  {:<8} {:<8} {:>8}  {place}",
                                e.id,
                                e.number,
                                e.kind.label(),
                                e.last_reading
                            );
                        }
                    }
                }
            }
            EquipmentCommand::Edit {
                equipment,
                price,
                percent,
                reading,
            } => {
                let id = self.equipment_id(&equipment)?;
                let mut updated = self.state.get::<Equipment>(&id)?.clone();
                if let Some(price) = price {
                    let price = self.money(&price)?;
                    match &mut updated.mode {
                        BillingMode::PerPlay { price_per_play } => *price_per_play = price,
                        BillingMode::CashBox => {
                            return Err(Error::validation(
                                "price",
                                "cash box machines have no price per play",
                            )
                            .into())
                        }
                    }
                }
                if let Some(percent) = percent {
                    updated.customer_percent = self.percent(&percent)?;
                }
                if let Some(reading) = reading {
                    updated.last_reading = reading;
                }
                let number = updated.number.clone();
                self.state.update_equipment(updated).await?;
                notify(&Notice::success(format!("equipment {number} updated")));
            }
            EquipmentCommand::Install {
                equipment,
                customer,
            } => {
                let id = self.equipment_id(&equipment)?;
                let customer_id = customer.map(|c| self.customer_id(&c)).transpose()?;
                self.state
                    .install_equipment(&id, customer_id.as_deref())
                    .await?;
                notify(&Notice::success(match customer_id {
                    Some(_) => "equipment installed".to_string(),
                    None => "equipment back in stock".to_string(),
                }));
            }
            EquipmentCommand::Delete { equipment } => {
                let id = self.equipment_id(&equipment)?;
                let removed = self.state.delete_equipment(&id).await?;
                notify(&Notice::success(format!("equipment {} deleted", removed.number)));
            }
        }
        Ok(())
    }

    async fn billing(&mut self, cmd: BillingCommand) -> CliResult {
        match cmd {
            BillingCommand::Record {
                equipment,
                values,
                share,
            } => {
                let id = self.equipment_id(&equipment)?;
                let input = self.billing_input(&id, &values)?;
                let billing = self.state.record_billing(&id, input, values.notes).await?;
                notify(&Notice::success(format!(
                    "billing recorded ({}), new debt {}",
                    billing.id,
                    self.fmt(billing.breakdown.new_debt)
                )));
                self.print_billing(&billing.id, share)?;
            }
            BillingCommand::Edit { billing, values } => {
                let original = self.state.get::<acerto::model::Billing>(&billing)?.clone();
                let input = self.edited_input(&original.input, &values)?;
                let notes = values.notes.or(original.notes);
                let updated = self.state.edit_billing(&billing, input, notes).await?;
                notify(&Notice::success(format!(
                    "billing updated, debt left by the visit {}",
                    self.fmt(updated.breakdown.new_debt)
                )));
            }
            BillingCommand::Delete { billing } => {
                let removed = self.state.delete_billing(&billing).await?;
                notify(&Notice::success(format!(
                    "billing of {} on {} deleted",
                    removed.equipment_number,
                    removed.date.with_timezone(&Local).format("%Y-%m-%d")
                )));
            }
            BillingCommand::List {
                customer,
                limit,
                format,
            } => {
                let mut billings: Vec<_> = match customer {
                    Some(c) => {
                        let id = self.customer_id(&c)?;
                        self.state.billings_for(&id)
                    }
                    None => self.state.billings().iter().collect(),
                };
                billings.sort_by(|a, b| b.date.cmp(&a.date));
                billings.truncate(limit);
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&billings)?),
                    OutputFormat::Plain => {
                        for b in billings {
                            let customer = self
                                .state
                                .find::<Customer>(&b.customer_id)
                                .map_or("?", |c| c.name.as_str());
                            println!(
                                "{}  {}  {:<8} {:<24} {:>14}",
                                b.id,
                                b.date.with_timezone(&Local).format("%Y-%m-%d"),
                                b.equipment_number,
                                customer,
                                self.fmt(b.breakdown.house_share)
                            );
                        }
                    }
                }
            }
            BillingCommand::Receipt { billing, share } => self.print_billing(&billing, share)?,
        }
        Ok(())
    }

    fn billing_input(&self, equipment_id: &str, values: &BillingValues) -> CliResult<BillingInput> {
        let equipment = self.state.get::<Equipment>(equipment_id)?;
        let Some(customer_id) = equipment.customer_id.as_deref() else {
            bail!(Error::validation(
                "equipment",
                format!("{} is not installed at a customer", equipment.number),
            ));
        };
        let customer = self.state.get::<Customer>(customer_id)?;

        let mut input = BillingInput::for_equipment(equipment, customer, values.reading);
        if let Some(counted) = &values.counted {
            input = input.with_counted(self.money(counted)?);
        }
        if let Some(discount) = &values.discount {
            input = input.with_discount(self.money(discount)?);
        }
        if let Some(paid) = &values.paid {
            input = input.with_paid(self.money(paid)?);
        }
        if values.reset {
            input = input.with_reset();
        }
        Ok(input)
    }

    fn edited_input(&self, original: &BillingInput, values: &BillingEdit) -> CliResult<BillingInput> {
        let mut input = original.clone();
        if let Some(reading) = values.reading {
            input.current_reading = reading;
        }
        if let Some(counted) = &values.counted {
            let RevenueInput::Counted { amount } = &mut input.revenue else {
                bail!(Error::validation("counted", "this visit was billed per play"));
            };
            *amount = Some(self.money(counted)?);
        }
        if let Some(discount) = &values.discount {
            input.discount = self.money(discount)?;
        }
        if let Some(paid) = &values.paid {
            input.amount_paid = self.money(paid)?;
        }
        Ok(input)
    }

    fn print_billing(&self, billing_id: &str, share: bool) -> CliResult {
        let billing = self.state.get::<acerto::model::Billing>(billing_id)?;
        let customer = self.state.get::<Customer>(&billing.customer_id)?;
        let equipment = self.state.find::<Equipment>(&billing.equipment_id);
        if share {
            let text = receipt::billing_share_text(billing, customer, equipment, &self.style);
            println!("{text}");
            if let Some(phone) = customer.phone.as_deref() {
                println!();
                println!("{}", receipt::whatsapp_link(phone, &text));
            }
        } else {
            print!("{}", receipt::billing_receipt(billing, customer, equipment, &self.style));
        }
        Ok(())
    }

    async fn debt(&mut self, cmd: DebtCommand) -> CliResult {
        match cmd {
            DebtCommand::Pay {
                customer,
                amount,
                method,
                notes,
                share,
            } => {
                let id = self.customer_id(&customer)?;
                let amount = self.money(&amount)?;
                let payment = self.state.pay_debt(&id, amount, method.into(), notes).await?;
                notify(&Notice::success(format!(
                    "payment of {} registered, debt now {}",
                    self.fmt(payment.amount),
                    self.fmt(payment.debt_after())
                )));
                let customer = self.state.get::<Customer>(&id)?;
                if share {
                    let text = receipt::payment_share_text(&payment, customer, &self.style);
                    println!("{text}");
                    if let Some(phone) = customer.phone.as_deref() {
                        println!();
                        println!("{}", receipt::whatsapp_link(phone, &text));
                    }
                } else {
                    print!("{}", receipt::debt_payment_receipt(&payment, customer, &self.style));
                }
            }
            DebtCommand::List => {
                let mut debtors: Vec<&Customer> =
                    self.state.customers().iter().filter(|c| c.has_debt()).collect();
                debtors.sort_by(|a, b| b.debt.cmp(&a.debt));
                let total: Money = debtors.iter().map(|c| c.debt).sum();
                for c in debtors {
                    println!("{:<30} {:>14}", c.name, self.fmt(c.debt));
                }
                println!("{:<30} {:>14}", "Total", self.fmt(total));
            }
        }
        Ok(())
    }

    async fn expense(&mut self, cmd: ExpenseCommand) -> CliResult {
        match cmd {
            ExpenseCommand::Add {
                description,
                amount,
                category,
            } => {
                let expense = Expense::new(description, category.into(), self.money(&amount)?);
                let id = expense.id.clone();
                self.state.add_expense(expense).await?;
                notify(&Notice::success(format!("expense added ({id})")));
            }
            ExpenseCommand::List { format } => {
                let mut expenses: Vec<&Expense> = self.state.expenses().iter().collect();
                expenses.sort_by(|a, b| b.date.cmp(&a.date));
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&expenses)?),
                    OutputFormat::Plain => {
                        for e in expenses {
                            println!(
                                "{}  {}  {:<12} {:<24} {:>14}",
                                e.id,
                                e.date.with_timezone(&Local).format("%Y-%m-%d"),
                                e.category.label(),
                                e.description,
                                self.fmt(e.amount)
                            );
                        }
                    }
                }
            }
            ExpenseCommand::Delete { expense } => {
                let removed = self.state.delete_expense(&expense).await?;
                notify(&Notice::success(format!("expense '{}' deleted", removed.description)));
            }
        }
        Ok(())
    }

    async fn warning(&mut self, cmd: WarningCommand) -> CliResult {
        match cmd {
            WarningCommand::Add {
                message,
                customer,
                equipment,
            } => {
                let mut warning = Warning::new(message);
                if let Some(customer) = customer {
                    warning = warning.for_customer(self.customer_id(&customer)?);
                }
                if let Some(equipment) = equipment {
                    warning = warning.for_equipment(self.equipment_id(&equipment)?);
                }
                let id = warning.id.clone();
                self.state.add_warning(warning).await?;
                notify(&Notice::success(format!("warning added ({id})")));
            }
            WarningCommand::List { all } => {
                for w in self.state.warnings().iter().filter(|w| all || !w.is_resolved()) {
                    let about = w
                        .customer_id
                        .as_deref()
                        .and_then(|id| self.state.find::<Customer>(id))
                        .map(|c| format!(" [{}]", c.name))
                        .unwrap_or_default();
                    let done = if w.is_resolved() { " (resolved)" } else { "" };
                    println!("{}  {}{about}{done}", w.id, w.message);
                }
            }
            WarningCommand::Resolve { warning } => {
                self.state.resolve_warning(&warning).await?;
                notify(&Notice::success("warning resolved"));
            }
        }
        Ok(())
    }

    async fn route(&mut self, cmd: RouteCommand) -> CliResult {
        match cmd {
            RouteCommand::Save {
                name,
                customers,
                weekday,
                id,
            } => {
                let mut route = match id {
                    Some(id) => {
                        let mut existing = self.state.get::<Route>(&id)?.clone();
                        existing.name = name;
                        existing
                    }
                    None => Route::new(name),
                };
                route.customer_ids = customers
                    .iter()
                    .map(|c| self.customer_id(c))
                    .collect::<acerto::Result<_>>()?;
                route.weekday = weekday;
                let (id, stops) = (route.id.clone(), route.len());
                self.state.save_route(route).await?;
                notify(&Notice::success(format!("route saved with {stops} stop(s) ({id})")));
            }
            RouteCommand::List => {
                for r in self.state.routes() {
                    let day = r.weekday.map(|d| format!(" ({d})")).unwrap_or_default();
                    println!("{}  {}{day}  {} stop(s)", r.id, r.name, r.len());
                }
            }
            RouteCommand::Show { route } => {
                let id = self.route_id(&route)?;
                self.print_route(&id)?;
            }
            RouteCommand::Optimize { route } => {
                let id = self.route_id(&route)?;
                self.state.optimize_route(&id, self.config.depot()).await?;
                notify(&Notice::success("route reordered"));
                self.print_route(&id)?;
            }
            RouteCommand::Delete { route } => {
                let id = self.route_id(&route)?;
                let removed = self.state.delete_route(&id).await?;
                notify(&Notice::success(format!("route {} deleted", removed.name)));
            }
        }
        Ok(())
    }

    fn print_route(&self, route_id: &str) -> CliResult {
        let route = self.state.get::<Route>(route_id)?;
        println!("{}", route.name);
        let mut points: Vec<GeoPoint> = Vec::new();
        for (i, customer_id) in route.customer_ids.iter().enumerate() {
            let customer = self.state.find::<Customer>(customer_id);
            let name = customer.map_or("?", |c| c.name.as_str());
            let debt = customer
                .filter(|c| c.has_debt())
                .map(|c| format!("  debt {}", self.fmt(c.debt)))
                .unwrap_or_default();
            println!("{:>3}. {name}{debt}", i + 1);
            points.extend(customer.and_then(|c| c.location));
        }
        if !points.is_empty() {
            println!(
                "     ~{:.1} km",
                route_length_km(self.config.depot(), &points)
            );
        }
        Ok(())
    }

    fn pix(&self, cmd: &PixCommand) -> CliResult {
        let Some(mut payload) = self.config.pix_template() else {
            bail!("no PIX key configured; set pix.key in {}", Config::default_config_path().display());
        };
        if let Some(amount) = &cmd.amount {
            payload = payload.with_amount(self.money(amount)?);
        }
        if let Some(reference) = &cmd.reference {
            payload = payload.with_txid(reference.clone());
        }
        if let Some(description) = &cmd.description {
            payload = payload.with_description(description.clone());
        }
        println!("{}", payload.encode()?);
        Ok(())
    }

    fn report(&self, cmd: &ReportCommand) -> CliResult {
        let period = match (cmd.month, cmd.from, cmd.to) {
            (_, Some(from), Some(to)) => Period::days(from, to)?,
            (Some(month), _, _) => Period::month_of(month),
            _ => Period::month_of(Local::now().date_naive()),
        };
        let summary = Summary::compute(self.state.data(), period);
        match cmd.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
            OutputFormat::Plain => print!("{}", summary.render(self.config.business.locale)),
        }
        Ok(())
    }

    fn status(&self, docs: &SqliteDocumentStore, json: bool) -> CliResult {
        let stats = docs.stats()?;
        let queued = self.state.queue().len()?;
        let open_warnings = self
            .state
            .warnings()
            .iter()
            .filter(|w| !w.is_resolved())
            .count();
        let debt: Money = self.state.customers().iter().map(|c| c.debt).sum();

        if json {
            let status = serde_json::json!({
                "online": self.state.is_online(),
                "account": self.state.account(),
                "database_path": docs.path(),
                "local_path": self.state.queue().local().path(),
                "documents": stats.total_documents,
                "db_size_bytes": stats.db_size_bytes,
                "queued_changes": queued,
                "customers": self.state.customers().len(),
                "equipment": self.state.equipment().len(),
                "billings": self.state.billings().len(),
                "open_warnings": open_warnings,
                "outstanding_debt": debt,
                "checked_at": Utc::now(),
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        } else {
            println!("acerto status");
            println!("-------------");
            println!("Mode:          {}", if self.state.is_online() { "online" } else { "offline" });
            println!("Account:       {}", self.state.account());
            println!("Database:      {}", docs.path().display());
            println!("Documents:     {}", stats.total_documents);
            println!("Queued:        {queued}");
            println!("Customers:     {}", self.state.customers().len());
            println!("Equipment:     {}", self.state.equipment().len());
            println!("Billings:      {}", self.state.billings().len());
            println!("Warnings:      {open_warnings} open");
            println!("Open debt:     {}", self.fmt(debt));
        }
        Ok(())
    }
}

fn new_customer(args: CustomerArgs) -> Customer {
    let mut customer = Customer::new(args.name);
    customer.phone = args.phone;
    customer.address = args.address;
    customer.city = args.city;
    customer.notes = args.notes;
    if let (Some(lat), Some(lon)) = (args.latitude, args.longitude) {
        customer = customer.with_location(GeoPoint::new(lat, lon));
    }
    customer
}

fn apply_customer_edit(customer: &mut Customer, edit: CustomerEdit) {
    if let Some(name) = edit.name {
        customer.name = name;
    }
    if let Some(phone) = edit.phone {
        customer.phone = Some(phone).filter(|p| !p.trim().is_empty());
    }
    if let Some(address) = edit.address {
        customer.address = Some(address).filter(|a| !a.trim().is_empty());
    }
    if let Some(city) = edit.city {
        customer.city = Some(city).filter(|c| !c.trim().is_empty());
    }
    if let (Some(lat), Some(lon)) = (edit.latitude, edit.longitude) {
        customer.location = Some(GeoPoint::new(lat, lon));
    }
    if edit.deactivate {
        customer.active = false;
    }
    if edit.activate {
        customer.active = true;
    }
    if let Some(notes) = edit.notes {
        customer.notes = Some(notes).filter(|n| !n.trim().is_empty());
    }
}
