//! Belle CLI

use std::{
    io::{self, Write},
    process::ExitCode,
};

use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;
use tracing::{debug, error};

use belle::{
    cart::{
        CartStore, DecantValidity,
        line::{ItemType, LineKey},
        message::MessageLauncher,
    },
    catalog::{CatalogView, FilterDimension},
    config::{AddArgs, CartAction, CatalogArgs, Command, Config, LineArgs, StoreConfig},
    fixtures::{self, FixtureError},
    observability::{self, ObservabilityError},
    pricing::{offer_price, offer_prices},
    products::{Product, on_offer},
    storage::{ExpiringStorage, FileStore},
};

/// Errors surfaced to the command line.
#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Observability(#[from] ObservabilityError),

    #[error("failed to load products: {0}")]
    Fixture(#[from] FixtureError),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),

    #[error("unknown product: {0}")]
    UnknownProduct(String),

    #[error("product {0} is out of stock or has no price")]
    NotPurchasable(String),

    #[error("product {0} is not sold as a decant")]
    NoDecant(String),

    #[error("the cart is empty")]
    EmptyCart,

    #[error("decants can only be ordered together with at least one full bottle")]
    DecantsWithoutFull,
}

type Cart = CartStore<FileStore>;

/// Prints the deep link instead of launching a browser.
#[derive(Debug)]
struct StdoutLauncher;

impl MessageLauncher for StdoutLauncher {
    fn open(&self, url: &str) {
        _ = writeln!(io::stdout(), "{url}");
    }
}

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(error) => {
            // Help and version requests are reported through the same path.
            _ = error.print();

            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(error) = run(config) {
        error!("{error}");

        #[expect(
            clippy::print_stderr,
            reason = "the failure must reach the user even when logging is filtered"
        )]
        {
            eprintln!("error: {error}");
        }

        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(config: Config) -> Result<(), CliError> {
    observability::init(&config.logging)?;

    let mut out = io::stdout().lock();

    match config.command {
        Command::Catalog(args) => catalog(&config.store, args, &mut out),
        Command::Offers => offers(&config.store, &mut out),
        Command::Cart(command) => cart(&config.store, command.action, &mut out),
    }
}

fn catalog(store: &StoreConfig, args: CatalogArgs, out: &mut impl Write) -> Result<(), CliError> {
    let mut view = CatalogView::new(store.batch_size);
    view.replace_products(fixtures::load_products(&store.products)?);

    if args.options {
        for dimension in FilterDimension::ALL {
            writeln!(out, "{dimension:?}: {}", view.options().get(dimension).join(", "))?;
        }

        return Ok(());
    }

    view.update_query(|query| {
        query.search = args.search;
        query.sort = args.sort;

        for (dimension, value) in args.filters {
            query.filters.set(dimension, value.as_str());
        }
    });

    for _ in 1..args.pages {
        if !view.on_sentinel_visible() {
            break;
        }
    }

    let mut builder = Builder::default();
    builder.push_record(["ID", "Producto", "Marca", "Precio", "Decant", "Stock"].map(String::from));

    for product in view.visible() {
        builder.push_record([
            product.id.clone(),
            product.nombre.clone(),
            product.marca.clone(),
            product.unit_price().map(|p| format!("${p}")).unwrap_or_default(),
            product.decant_price().map(|p| format!("${p}")).unwrap_or_default(),
            if product.in_stock() {
                product.stock.to_string()
            } else {
                "Sin stock".to_string()
            },
        ]);
    }

    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.modify(Columns::new(3..), Alignment::right());

    writeln!(out, "{table}")?;
    writeln!(
        out,
        "{} de {} · orden: {}{}",
        view.window().visible_count(),
        view.len(),
        view.query().sort,
        if view.has_more() { " · hay más" } else { "" }
    )?;

    Ok(())
}

fn offers(store: &StoreConfig, out: &mut impl Write) -> Result<(), CliError> {
    let products = fixtures::load_products(&store.products)?;

    let mut builder = Builder::default();
    builder.push_record(["ID", "Producto", "Etiqueta", "Precio", "Oferta"].map(String::from));

    for product in on_offer(&products) {
        builder.push_record([
            product.id.clone(),
            product.nombre.clone(),
            product.offer_label(),
            product.unit_price().map(|p| format!("${p}")).unwrap_or_default(),
            format!("${}", offer_price(product)),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.modify(Columns::new(3..), Alignment::right());

    writeln!(out, "{table}")?;

    Ok(())
}

fn cart(store: &StoreConfig, action: CartAction, out: &mut impl Write) -> Result<(), CliError> {
    let mut cart: Cart = CartStore::load(ExpiringStorage::new(FileStore::new(&store.cart_file)))
        .with_whatsapp_number(store.whatsapp_number.clone());

    match action {
        CartAction::Show => show(&cart, out),
        CartAction::Add(args) => {
            let product = find_product(store, &args.id)?;
            add_full(&mut cart, &product, &args);

            show(&cart, out)
        }
        CartAction::AddDecant(args) => {
            let product = find_product(store, &args.id)?;
            let price = product
                .decant_price()
                .ok_or_else(|| CliError::NoDecant(args.id.clone()))?;

            cart.add_decant_n(&product, price, args.qty);

            show(&cart, out)
        }
        CartAction::Remove(line) => {
            cart.remove_line(&line_key(line));

            show(&cart, out)
        }
        CartAction::SetQty { line, qty } => {
            cart.update_qty(&line_key(line), qty);

            show(&cart, out)
        }
        CartAction::Checkout => match cart.checkout(&StdoutLauncher) {
            Some(_) => Ok(()),
            None if cart.is_empty() => Err(CliError::EmptyCart),
            None => Err(CliError::DecantsWithoutFull),
        },
    }
}

fn find_product(store: &StoreConfig, id: &str) -> Result<Product, CliError> {
    let product = fixtures::load_products(&store.products)?
        .into_iter()
        .find(|product| product.id == id)
        .ok_or_else(|| CliError::UnknownProduct(id.to_string()))?;

    if !product.is_purchasable() {
        return Err(CliError::NotPurchasable(id.to_string()));
    }

    Ok(product)
}

fn add_full(cart: &mut Cart, product: &Product, args: &AddArgs) {
    let prices = if args.offer && product.has_active_offer() {
        debug!(id = %product.id, "adding at offer prices");
        offer_prices(product)
    } else {
        product.price_table()
    };

    cart.add_full_n(product, prices, args.qty);
}

fn line_key(line: LineArgs) -> LineKey {
    if line.decant {
        LineKey::decant(line.id)
    } else {
        LineKey::full(line.id)
    }
}

fn show(cart: &Cart, out: &mut impl Write) -> Result<(), CliError> {
    if cart.is_empty() {
        writeln!(out, "El carrito está vacío.")?;

        return Ok(());
    }

    let tier = cart.tier();

    let mut builder = Builder::default();
    builder.push_record(["ID", "Producto", "Tipo", "Cant.", "Precio", "Subtotal"].map(String::from));

    for line in cart.items() {
        builder.push_record([
            line.id.clone(),
            format!("{} - {}", line.marca, line.name),
            match line.item_type {
                ItemType::Full => "Perfume".to_string(),
                ItemType::Decant => "Decant 5ml".to_string(),
            },
            line.qty.to_string(),
            format!("${}", line.unit_price(tier)),
            format!("${}", line.line_total(tier)),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.modify(Columns::new(3..), Alignment::right());

    writeln!(out, "{table}")?;
    writeln!(out, "Precio: {tier} ({} unid.)", cart.full_count())?;
    writeln!(out, "Perfumes: ${}", cart.full_subtotal())?;
    writeln!(out, "Decants: ${}", cart.decant_subtotal())?;
    writeln!(out, "Total: ${}", cart.total())?;

    if cart.decant_validity() == DecantValidity::Invalid {
        writeln!(out, "Los decants requieren al menos un perfume completo en el pedido.")?;
    }

    Ok(())
}
