use apollo_compiler::Name;

use super::OperationKind;

/// Join a flat-name prefix and a name with `_`
pub(crate) fn combine(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}_{name}")
    }
}

/// The parameter name for `name` under `prefix`. Parameter names are lowercase.
pub(crate) fn flat_name(prefix: &str, name: &str) -> String {
    combine(prefix, name).to_lowercase()
}

/// Where the walker is while rendering one operation.
///
/// A context is never changed in place. Every step down the return-type graph
/// derives a new one, so siblings always see the state from before their
/// preceding sibling's branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalContext {
    operation: String,
    prefix: String,
    num_args: usize,
    path: Vec<Name>,
}

impl TraversalContext {
    pub fn root(kind: OperationKind) -> Self {
        Self {
            operation: kind.to_string(),
            prefix: String::new(),
            num_args: 0,
            path: Vec::new(),
        }
    }

    /// The context for the fields of `object_type`, returned by `field_name`
    pub fn nested(&self, field_name: &str, object_type: &Name, num_args: usize) -> Self {
        let mut path = self.path.clone();
        path.push(object_type.clone());
        Self {
            operation: self.operation_path(field_name),
            prefix: combine(&self.prefix, field_name),
            num_args,
            path,
        }
    }

    /// Dotted path of `field_name` below this context, for diagnostics
    pub fn operation_path(&self, field_name: &str) -> String {
        format!("{}.{}", self.operation, field_name)
    }

    /// The prefix for parameters declared at this point. Empty for the root field.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Variables declared before this point of the operation
    pub fn num_args(&self) -> usize {
        self.num_args
    }

    /// Number of object selections enclosing this point
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn has_visited(&self, object_type: &str) -> bool {
        self.path.iter().any(|visited| visited.as_str() == object_type)
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;

    use super::*;

    #[test]
    fn root_context_is_empty() {
        let context = TraversalContext::root(OperationKind::Query);
        assert!(context.is_root());
        assert_eq!(context.depth(), 0);
        assert_eq!(context.num_args(), 0);
        assert_eq!(context.prefix(), "");
        assert_eq!(context.operation_path("orders"), "query.orders");
    }

    #[test]
    fn nested_contexts_extend_prefix_and_path() {
        let root = TraversalContext::root(OperationKind::Query);
        let order = root.nested("orders", &name!("Order"), 1);
        let item = order.nested("items", &name!("Item"), 3);

        assert_eq!(order.prefix(), "orders");
        assert_eq!(item.prefix(), "orders_items");
        assert_eq!(item.operation_path("product"), "query.orders.items.product");
        assert_eq!(item.num_args(), 3);
        assert_eq!(item.depth(), 2);
        assert!(item.has_visited("Order"));
        assert!(item.has_visited("Item"));
        assert!(!order.has_visited("Item"));
    }

    #[test]
    fn siblings_do_not_see_each_others_path() {
        let root = TraversalContext::root(OperationKind::Query);
        let order = root.nested("orders", &name!("Order"), 0);
        let _customer = order.nested("customer", &name!("Customer"), 0);
        let items = order.nested("items", &name!("Item"), 0);

        assert!(!items.has_visited("Customer"));
        assert_eq!(order.depth(), 1);
    }

    #[test]
    fn flat_names_are_lowercase() {
        assert_eq!(flat_name("", "customerId"), "customerid");
        assert_eq!(flat_name("orders_items", "first"), "orders_items_first");
        assert_eq!(flat_name("createOrder", "shippingAddress"), "createorder_shippingaddress");
    }
}
