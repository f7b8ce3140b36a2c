use std::sync::Arc;

use rust_decimal::Decimal;

use crate::clock::Clock;
use crate::config::Config;
use crate::database::Repositories;
use crate::database::entities::{NewOrder, NewOrderLine, OrderEntity, OrderStatus};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineRequest {
    pub item_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateOrderCommand {
    pub buyer_id: Option<i64>,
    pub restaurant_id: i64,
    pub table_number: Option<i32>,
    pub guest_name: Option<String>,
    pub lines: Vec<OrderLineRequest>,
}

/// 订单聚合器
///
/// 对照餐厅与菜品的当前状态校验购物车、计算总价，最后一次性写入订单。
/// 任一校验失败都会在写入前中止。
///
/// 校验与提交之间不锁定菜品价格，并发改价时订单可能使用改价前的快照。
pub struct OrderAggregator {
    repos: Repositories,
    clock: Arc<dyn Clock>,
    max_items: usize,
    max_quantity: i32,
}

impl OrderAggregator {
    pub fn new(repos: Repositories, clock: Arc<dyn Clock>, config: &Config) -> Self {
        Self {
            repos,
            clock,
            max_items: config.max_items_per_order,
            max_quantity: config.max_quantity_per_item,
        }
    }

    pub async fn create_order(&self, command: CreateOrderCommand) -> AppResult<OrderEntity> {
        // 行数只依赖请求本身，在访问存储之前检查
        self.check_line_count(command.lines.len())?;

        let restaurant = self
            .repos
            .restaurants
            .find_by_id(command.restaurant_id)
            .await?
            .ok_or_else(|| AppError::not_found("Restaurant not found"))?;

        if let Some(buyer_id) = command.buyer_id {
            if !self.repos.users.exists_by_id(buyer_id).await? {
                return Err(AppError::not_found("User not found"));
            }
        }

        if let Some(table_number) = command.table_number {
            if !restaurant.has_table(table_number) {
                return Err(AppError::invalid(format!(
                    "Invalid table number. Must be between 1 and {}",
                    restaurant.table_count
                )));
            }
        }

        let mut total = Decimal::ZERO;
        let mut lines = Vec::with_capacity(command.lines.len());
        for requested in &command.lines {
            if requested.quantity < 1 {
                return Err(AppError::invalid("Quantity must be greater than zero"));
            }
            if requested.quantity > self.max_quantity {
                return Err(AppError::invalid(format!(
                    "Quantity per item cannot exceed {} units",
                    self.max_quantity
                )));
            }

            let item = self
                .repos
                .items
                .find_by_id(requested.item_id)
                .await?
                .ok_or_else(|| {
                    AppError::not_found(format!("Item not found: {}", requested.item_id))
                })?;

            if item.restaurant_id != Some(restaurant.id) {
                return Err(AppError::invalid(format!(
                    "Item {} does not belong to this restaurant",
                    item.name
                )));
            }

            let line = NewOrderLine {
                item_id: item.id,
                name: item.name,
                price: item.price,
                quantity: requested.quantity,
            };
            total = line
                .price
                .checked_mul(Decimal::from(line.quantity))
                .and_then(|subtotal| total.checked_add(subtotal))
                .ok_or_else(|| AppError::invalid("Order total is out of range"))?;
            lines.push(line);
        }

        let order = NewOrder {
            buyer_id: command.buyer_id,
            restaurant_id: restaurant.id,
            table_number: command.table_number,
            guest_name: command.guest_name,
            total,
            status: OrderStatus::Pending,
            created_at: self.clock.now(),
            lines,
        };

        let saved = self.repos.orders.save_new(order).await?;
        tracing::info!(
            "Order {} created for restaurant {} with total {}",
            saved.id,
            saved.restaurant_id,
            saved.total
        );
        Ok(saved)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<OrderEntity> {
        self.repos
            .orders
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Order not found"))
    }

    pub async fn get_by_buyer(&self, buyer_id: i64) -> AppResult<Vec<OrderEntity>> {
        Ok(self.repos.orders.find_by_buyer_id(buyer_id).await?)
    }

    pub async fn get_by_restaurant(&self, restaurant_id: i64) -> AppResult<Vec<OrderEntity>> {
        Ok(self.repos.orders.find_by_restaurant_id(restaurant_id).await?)
    }

    /// 无条件删除订单及其订单行
    pub async fn delete_order(&self, id: i64) -> AppResult<()> {
        self.repos.orders.delete_by_id(id).await?;
        tracing::info!("Order {} deleted", id);
        Ok(())
    }

    fn check_line_count(&self, count: usize) -> AppResult<()> {
        if count == 0 {
            return Err(AppError::invalid("Order must contain at least 1 item"));
        }
        if count > self.max_items {
            return Err(AppError::invalid(format!(
                "Order exceeds the maximum of {} items",
                self.max_items
            )));
        }
        Ok(())
    }
}
