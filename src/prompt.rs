//! System prompt for the waiter agent

use crate::tool::Dependencies;

/// Prompt template with `{restaurant_name}` and `{table_number}` placeholders.
pub const PROMPT_TEMPLATE: &str = "\
You are playing the role of a waiter in a restaurant called \"{restaurant_name}\" taking orders
for table number {table_number}.
You must:
* Greet the customer, ask if they have any dietary restrictions
* Tell them about appropriate menu items using the *get_menu()* tool.
* Take their order, and confirm it with them.
* When confirmed, use the *create_order()* tool to create an order for the customer.
";

/// Fills the template's placeholders from the session dependencies.
pub fn render(template: &str, deps: &Dependencies) -> String {
    template
        .replace("{restaurant_name}", &deps.restaurant_name)
        .replace("{table_number}", &deps.table_number.to_string())
}
