//! Proc-macro crate providing `#[pg_test]` for tests that need a live
//! Postgres server.
//!
//! Unlike `#[sqlx::test]`, the test receives connection settings for a
//! database that does *not* exist yet, so the code under test exercises its
//! own database and table provisioning.

use proc_macro::TokenStream;
use quote::quote;
use syn::{FnArg, Ident, ItemFn, LitStr, Token, parse::Parse, parse::ParseStream};

struct Args {
    prefix: Option<String>,
}

impl Parse for Args {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut prefix = None;
        while !input.is_empty() {
            let key: Ident = input.parse()?;
            if key == "prefix" {
                let _eq: Token![=] = input.parse()?;
                let value: LitStr = input.parse()?;
                prefix = Some(value.value());
            } else {
                return Err(syn::Error::new_spanned(key, "unknown argument"));
            }
            if !input.is_empty() {
                let _comma: Token![,] = input.parse()?;
            }
        }
        Ok(Self { prefix })
    }
}

/// Run an async test against a throwaway database name.
///
/// # Usage
///
/// ```ignore
/// #[pg_test]
/// async fn my_test(db: historykeeper::config::DbConfig) {
///     // `db.database` names a database that does not exist yet
/// }
/// ```
///
/// The generated test:
/// 1. Skips unless `PGHOST` is set; other settings come from the libpq
///    environment variables via `DbConfig::from_env`
/// 2. Drops any leftover database from a crashed run
/// 3. Passes a `DbConfig` for `_hk_test_<fn name>` (or `<prefix><fn name>`)
/// 4. Drops that database once the body completes
#[proc_macro_attribute]
pub fn pg_test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = syn::parse_macro_input!(attr as Args);
    let input = syn::parse_macro_input!(item as ItemFn);

    let fn_name = &input.sig.ident;
    let fn_vis = &input.vis;

    let config_pat = match input.sig.inputs.first() {
        Some(FnArg::Typed(pat_type)) => &pat_type.pat,
        _ => {
            return syn::Error::new_spanned(
                &input.sig,
                "pg_test function must take a DbConfig argument",
            )
            .to_compile_error()
            .into();
        }
    };

    let prefix = args.prefix.unwrap_or_else(|| "_hk_test_".to_string());
    let db_name = format!("{prefix}{fn_name}");
    let fn_body = &input.block;
    let setup = gen_setup(&db_name, config_pat);

    let output = quote! {
        #[::tokio::test]
        #[ignore = "requires PGHOST to point at a Postgres server"]
        #fn_vis async fn #fn_name() {
            #setup

            // ── Test body ──────────────────────────────────────────
            { #fn_body }

            // ── Teardown ───────────────────────────────────────────
            let _ = ::sqlx::Executor::execute(&mut mgmt_conn, drop_stmt.as_str()).await;
            let _ = ::sqlx::Connection::close(mgmt_conn).await;
        }
    };

    output.into()
}

fn gen_setup(db_name: &str, config_pat: &syn::Pat) -> proc_macro2::TokenStream {
    quote! {
        if ::std::env::var("PGHOST").is_err() {
            return;
        }

        let base = ::historykeeper::config::DbConfig::from_env();
        let db_name: &str = #db_name;

        let mut mgmt_conn: ::sqlx::postgres::PgConnection =
            ::sqlx::Connection::connect_with(&base.maintenance_options())
                .await
                .expect("pg_test: failed to connect to maintenance database");

        // FORCE terminates connections the body's pools may still hold.
        let drop_stmt = format!(
            "DROP DATABASE IF EXISTS {} WITH (FORCE)",
            ::historykeeper::db::quote_ident(db_name)
        );
        ::sqlx::Executor::execute(&mut mgmt_conn, drop_stmt.as_str())
            .await
            .expect("pg_test: failed to drop leftover test database");

        let #config_pat: ::historykeeper::config::DbConfig = base.with_database(db_name);
    }
}
