//! Integration tests for the route guard together with cart transitions.

use twin_gain_core::{Access, Cart, Destination, Role, authorize};
use twin_gain_integration_tests::{identity, product};

#[test]
fn test_cart_requires_consumer() {
    assert_eq!(
        authorize(None, Role::Consumer),
        Access::Redirect(Destination::Landing)
    );

    let producer = identity("p", Role::Producer);
    assert_eq!(
        authorize(Some(&producer), Role::Consumer),
        Access::Redirect(Destination::Dashboard(Role::Producer))
    );
    assert_eq!(
        Destination::Dashboard(Role::Producer).path(),
        "/producer/dashboard"
    );

    let consumer = identity("c", Role::Consumer);
    assert_eq!(authorize(Some(&consumer), Role::Consumer), Access::Granted);
}

#[test]
fn test_consumer_cart_walkthrough() {
    let consumer = identity("c", Role::Consumer);
    assert_eq!(authorize(Some(&consumer), Role::Consumer), Access::Granted);

    let p1 = product("p1", 100);
    let mut cart = Cart::new();

    cart.add_item(p1.to_cart_item());
    assert_eq!(cart.total(), p1.price);

    cart.add_item(p1.to_cart_item());
    assert_eq!(cart.get(&p1.id).map(|item| item.quantity), Some(2));
    assert_eq!(cart.total().amount(), p1.price.times(2).amount());

    cart.update_quantity(&p1.id, 0);
    assert_eq!(cart.len(), 1);
    assert!(cart.total().amount().is_zero());
    assert_eq!(cart.item_count(), 0);

    cart.remove_item(&p1.id);
    assert!(cart.is_empty());
}

#[test]
fn test_mixed_cart_total_and_count() {
    let tea = product("tea", 250);
    let rice = product("rice", 80);
    let mut cart = Cart::new();

    cart.add_item(tea.to_cart_item());
    cart.add_item(rice.to_cart_item());
    cart.add_item(rice.to_cart_item());
    cart.update_quantity(&tea.id, -3);

    assert_eq!(cart.item_count(), 2);
    assert_eq!(cart.total().amount(), rice.price.times(2).amount());
    let order: Vec<&str> = cart.items().iter().map(|i| i.product_id.as_str()).collect();
    assert_eq!(order, ["tea", "rice"]);
}
