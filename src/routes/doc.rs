use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{AuthResponse, LoginRequest, MeResponse, RegisterRequest},
        cart::{AddToCartRequest, CartLineInput, CartList, ReplaceCartRequest, UpdateCartItemRequest},
        favorites::{FavoriteList, FavoriteRequest},
        metrics::{Dashboard, OrderMetrics, ProductMetrics, UserMetrics},
        notifications::{MarkAllReadResponse, NotificationList},
        orders::{CreateOrderRequest, OrderItemInput, OrderList, UpdateOrderStatusRequest},
        product_images::{ImageLinkRequest, ImageUploadForm, ProductImageList},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        reviews::{CreateReviewRequest, ReplyReviewRequest, ReviewList, ReviewSummary},
        users::{UpdateUserRequest, UserList},
    },
    error::ErrorBody,
    models::{
        CartItem, Favorite, Notification, NotificationKind, Order, OrderItem, OrderStatus, Product,
        ProductImage, Review, ReviewReply, Role, TargetType, User,
    },
    response::{Ack, ApiResponse, Meta},
    routes::{
        admin, auth, cart, favorites, health, metrics, notifications, orders, params,
        product_images, products, reviews, users,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "CodeMall API", description = "Multi-vendor marketplace"),
    paths(
        health::health_check,
        health::ping,
        auth::register,
        auth::login,
        auth::me,
        users::list_users,
        users::get_user,
        users::update_user,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        product_images::list_images,
        product_images::upload_image,
        product_images::delete_image,
        cart::cart_list,
        cart::replace_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::create_order,
        orders::checkout,
        orders::list_mine,
        orders::get_order,
        orders::update_order_status,
        favorites::add_favorite,
        favorites::remove_favorite,
        favorites::list_favorites,
        reviews::create_review,
        reviews::list_reviews,
        reviews::review_summary,
        reviews::reply_review,
        notifications::list_notifications,
        notifications::mark_read,
        notifications::mark_all_read,
        admin::ban_user,
        admin::unban_user,
        admin::approve_product,
        admin::revoke_product,
        admin::list_all_orders,
        metrics::dashboard
    ),
    components(
        schemas(
            Role,
            OrderStatus,
            TargetType,
            NotificationKind,
            User,
            Product,
            ProductImage,
            Favorite,
            CartItem,
            Order,
            OrderItem,
            Review,
            ReviewReply,
            Notification,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            MeResponse,
            UpdateUserRequest,
            UserList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            ImageLinkRequest,
            ImageUploadForm,
            ProductImageList,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartLineInput,
            ReplaceCartRequest,
            CartList,
            OrderItemInput,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            OrderList,
            FavoriteRequest,
            FavoriteList,
            CreateReviewRequest,
            ReplyReviewRequest,
            ReviewSummary,
            ReviewList,
            NotificationList,
            MarkAllReadResponse,
            ProductMetrics,
            UserMetrics,
            OrderMetrics,
            Dashboard,
            health::HealthData,
            health::Pong,
            params::OrderSide,
            Ack,
            ErrorBody,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Order>,
            ApiResponse<OrderList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Users", description = "User profile endpoints"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Product images", description = "Product image endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Favorites", description = "Favorite endpoints"),
        (name = "Reviews", description = "Review endpoints"),
        (name = "Notifications", description = "Notification endpoints"),
        (name = "Admin", description = "Moderation endpoints"),
        (name = "Metrics", description = "Dashboard endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
