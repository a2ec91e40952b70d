//! Order assembly.

use crate::tool::{Tool, ToolFailure};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

/// Orders below this total are pickup-only; delivery opens at the threshold.
pub const DELIVERY_THRESHOLD: i64 = 15_000;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct OrderItem {
    /// Product name exactly as found in the catalog.
    pub item_name: String,
    /// Unit price confirmed via the price lookup.
    pub price: i64,
    /// Number of units, defaults to one.
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

const fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateOrderArgs {
    /// Address of the pharmacy fulfilling the order.
    pub pharmacy_address: String,
    /// Contact phone of that pharmacy.
    pub pharmacy_phone: String,
    /// Where the client wants the order delivered.
    pub delivery_address: String,
    /// Client's name.
    pub client_name: String,
    /// Client's phone, already normalized via the phone check.
    pub client_number: String,
    /// Payment method agreed with the client.
    pub payment: String,
    /// Ordered positions.
    pub items: Vec<OrderItem>,
}

/// Produces the final order summary shown to the client.
#[derive(Debug, Clone, Copy)]
pub struct CreateOrderTool;

fn format_order(args: &CreateOrderArgs) -> String {
    let total: i64 = args
        .items
        .iter()
        .map(|item| item.price * item.quantity)
        .sum();

    // Small orders are pickup-only, so the delivery line shows the pharmacy.
    let delivery_line = if total < DELIVERY_THRESHOLD {
        &args.pharmacy_address
    } else {
        &args.delivery_address
    };

    let items_line = args
        .items
        .iter()
        .map(|item| format!("{} ({} x {})", item.item_name, item.quantity, item.price))
        .collect::<Vec<_>>()
        .join("; ");

    format!(
        "Ваш Заказ:\n\
         Адрес Аптеки: {pharmacy_address}\n\
         Телефон Аптеки: {pharmacy_phone}\n\
         Адрес доставки: {delivery_line}\n\
         Имя клиента: {client_name}\n\
         Номер клиента: {client_number}\n\
         Метод оплаты: {payment}\n\
         \n\
         Перечень товаров: {items_line}\n\
         Итого: {total}=",
        pharmacy_address = args.pharmacy_address,
        pharmacy_phone = args.pharmacy_phone,
        client_name = args.client_name,
        client_number = args.client_number,
        payment = args.payment,
    )
}

#[async_trait]
impl Tool for CreateOrderTool {
    const NAME: &'static str = "create_order";
    type Args = CreateOrderArgs;
    type Output = String;

    fn description(&self) -> &str {
        "Create the final order summary. Call only after the client phone \
         number is validated and every item price is confirmed. Orders under \
         15000 are pickup-only."
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, ToolFailure> {
        if args.items.is_empty() {
            return Err(ToolFailure::execution("order has no items"));
        }
        Ok(format_order(&args))
    }
}
